//! Deterministic mapping of runner statuses onto the remote vocabulary.

use crate::{
    client::{ItemStatus, LogLevel},
    event::Status,
};

/// Maps a runner [`Status`] onto the remote [`ItemStatus`].
///
/// Total: statuses this crate has no mapping for degrade to
/// [`ItemStatus::Skipped`] with a warning — they originate from an
/// external, potentially-evolving runner and must never fail the relay.
pub(crate) fn item_status(status: &Status) -> ItemStatus {
    match status {
        Status::Passed => ItemStatus::Passed,
        Status::Failed => ItemStatus::Failed,
        Status::Skipped
        | Status::Pending
        | Status::Ambiguous
        | Status::Undefined
        | Status::Unused => ItemStatus::Skipped,
        Status::Other(other) => {
            tracing::warn!(
                status = %other,
                "no direct mapping for runner status, reporting as SKIPPED",
            );
            ItemStatus::Skipped
        }
    }
}

/// Maps a runner [`Status`] onto the severity its diagnostics are logged
/// at.
pub(crate) fn log_level(status: &Status) -> LogLevel {
    match status {
        Status::Passed => LogLevel::Info,
        Status::Failed => LogLevel::Error,
        Status::Skipped
        | Status::Pending
        | Status::Ambiguous
        | Status::Undefined
        | Status::Unused
        | Status::Other(_) => LogLevel::Warn,
    }
}
