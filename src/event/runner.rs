//! The nine lifecycle events a runner delivers to the relay.

use super::{StepOutcome, TestCase, TestStep};

/// Lifecycle event of a BDD runner.
///
/// Per worker thread the stream is ordered; across threads events of
/// different scenarios interleave arbitrarily. `RunStarted` is always the
/// first event of a run and `RunFinished` the last one.
#[derive(Clone, Debug)]
pub enum RunnerEvent {
    /// The run has started.
    RunStarted,

    /// A `.feature` source file has been read.
    ///
    /// Sent once per source before any of its test cases start; a repeated
    /// event for the same URI replaces the previously recorded source.
    SourceRead(Source),

    /// Execution of a test case is about to start.
    TestCaseStarted(TestCase),

    /// Execution of a test step (or hook) is about to start.
    TestStepStarted(TestStep),

    /// A test step (or hook) has finished.
    TestStepFinished(TestStep, StepOutcome),

    /// The current test case has finished.
    TestCaseFinished(StepOutcome),

    /// The run has finished.
    RunFinished,

    /// An inline attachment was produced by the running scenario.
    Embed(Embedding),

    /// Free text was written by the running scenario.
    Write(String),
}

/// Raw `.feature` source announced by a `SourceRead` event.
#[derive(Clone, Debug)]
pub struct Source {
    /// URI of the source file.
    pub uri: String,

    /// Raw Gherkin text.
    pub source: String,
}

/// Inline attachment produced by a running scenario (a screenshot, a log
/// dump).
#[derive(Clone, Debug)]
pub struct Embedding {
    /// Declared content type, when the producer knows it.
    pub content_type: Option<String>,

    /// Raw attachment bytes.
    pub data: Vec<u8>,

    /// Explicit attachment name, when the producer supplies one.
    pub name: Option<String>,
}
