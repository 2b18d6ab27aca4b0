//! Runtime test-case handle delivered with `TestCaseStarted` events.

/// One runtime execution of a scenario (or of a single example row of a
/// scenario outline).
///
/// This is the runner's handle, not the Gherkin AST: [`TestCase::line`]
/// points at the scenario definition for a plain scenario and at the
/// *example-table row* for an outline iteration, and [`TestCase::tags`] is
/// the effective tag list (outline rows may carry per-row tags on top of
/// the definition's own).
#[derive(Clone, Debug)]
pub struct TestCase {
    /// URI of the `.feature` source this test case originates from.
    pub uri: String,

    /// Source line of the scenario definition, or of the example row for an
    /// outline iteration.
    pub line: usize,

    /// Name of the scenario, with outline placeholders already resolved by
    /// the runner.
    pub name: String,

    /// Effective tags of this test case.
    pub tags: Vec<String>,

    /// Runner-assigned designation string (`<uri>:<line> # <name>` or
    /// similar), unique per runtime test case.
    pub designation: String,
}
