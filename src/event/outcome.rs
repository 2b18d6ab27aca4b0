//! Result of a finished test step or test case.

use derive_more::Display;

/// Execution status the runner attached to a finished step or test case.
///
/// The runner's status vocabulary is not under this crate's control and may
/// grow; statuses this crate has no knowledge of arrive as
/// [`Status::Other`] and degrade to `SKIPPED` when mapped onto the remote
/// service (never failing the relay).
#[derive(Clone, Debug, Display, PartialEq, Eq)]
pub enum Status {
    /// Step or test case finished successfully.
    #[display("passed")]
    Passed,

    /// Step or test case failed.
    #[display("failed")]
    Failed,

    /// Step or test case was skipped.
    #[display("skipped")]
    Skipped,

    /// Step matched a pending definition.
    #[display("pending")]
    Pending,

    /// Step matched more than one definition.
    #[display("ambiguous")]
    Ambiguous,

    /// Step matched no definition.
    #[display("undefined")]
    Undefined,

    /// Step was never reached.
    #[display("unused")]
    Unused,

    /// A status this crate has no mapping for.
    #[display("{_0}")]
    Other(String),
}

/// Result the runner delivers with `TestStepFinished` and
/// `TestCaseFinished` events.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Final [`Status`].
    pub status: Status,

    /// Error message (with backtrace, if the runner provides one) of a
    /// failed step.
    pub error_message: Option<String>,
}

impl StepOutcome {
    /// Creates a [`StepOutcome`] with the given [`Status`] and no error.
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self { status, error_message: None }
    }

    /// Attaches an error message to this [`StepOutcome`].
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}
