//! Key occurrences in a lifecycle of a BDD runner's execution.
//!
//! The top-level enum here is [`RunnerEvent`]: the nine lifecycle events a
//! runner delivers to this crate, ordered per worker thread. Events for one
//! scenario always arrive in order on one thread; events for different
//! scenarios may interleave arbitrarily across threads.
//!
//! Every event is wrapped into an [`Event`] carrying the [`SystemTime`] of
//! when it has happened; those timestamps are what the relay reports as
//! remote start/finish times.
//!
//! [`SystemTime`]: std::time::SystemTime

mod event_struct;
mod outcome;
mod runner;
mod step;
mod test_case;

pub use self::{
    event_struct::{Event, Metadata},
    outcome::{Status, StepOutcome},
    runner::{Embedding, RunnerEvent, Source},
    step::{HookKind, HookStep, PickleStep, StepArgument, StepDefinition, TestStep},
    test_case::TestCase,
};
