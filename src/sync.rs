//! Small synchronization helpers shared across the crate.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Acquires the `mutex` ignoring poisoning.
///
/// Event handlers never hold a guard across user code, so a poisoned lock can
/// only mean a panic inside this crate; the protected maps stay structurally
/// valid in that case.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
