//! Runtime test-step handles delivered with step events.

use derive_more::Display;

use crate::client::Attribute;

/// Runtime step the runner is about to execute (or has just finished).
///
/// Polymorphic over the two kinds of things a runner schedules inside a
/// test case: Gherkin ("pickle") steps and lifecycle hooks.
#[derive(Clone, Debug)]
pub enum TestStep {
    /// A Gherkin step of the scenario (or of its background).
    Pickle(PickleStep),

    /// A runner-invoked setup/teardown callback.
    Hook(HookStep),
}

impl TestStep {
    /// Display name of this step: the resolved step text, or
    /// `Hook: <kind>` for hooks.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Pickle(step) => step.text.clone(),
            Self::Hook(hook) => format!("Hook: {}", hook.kind),
        }
    }
}

/// Runtime Gherkin step with outline placeholders already resolved.
#[derive(Clone, Debug)]
pub struct PickleStep {
    /// Source line of the step definition inside the scenario (for outline
    /// iterations this is the outline's own step line, not the example
    /// row).
    pub line: usize,

    /// Resolved step text.
    pub text: String,

    /// Arguments the step definition matched out of the text, in match
    /// order.
    pub arguments: Vec<String>,

    /// Multiline argument attached to the step, if any.
    pub argument: Option<StepArgument>,

    /// Metadata of the matched step definition, when the runner exposes it.
    pub definition: Option<StepDefinition>,
}

/// Multiline argument of a Gherkin step.
#[derive(Clone, Debug)]
pub enum StepArgument {
    /// A doc-string block.
    DocString(String),

    /// A data table, row-major.
    Table(Vec<Vec<String>>),
}

/// Capability record describing the step definition a runtime step matched.
///
/// The runner may not be able to provide any of this (dynamically registered
/// steps, foreign-language glue); every field degrades gracefully when
/// absent.
#[derive(Clone, Debug, Default)]
pub struct StepDefinition {
    /// Stable code reference of the definition: fully-qualified owner path
    /// without a parameter list.
    pub code_ref: Option<String>,

    /// Explicitly declared test-case identifier.
    pub test_case_id: Option<String>,

    /// Attributes declared on the definition.
    pub attributes: Vec<Attribute>,
}

/// Runtime hook step.
#[derive(Clone, Debug)]
pub struct HookStep {
    /// Kind of the hook.
    pub kind: HookKind,

    /// Runner's code-location string of the hook definition.
    pub code_location: String,
}

/// Kind of a runner-invoked setup/teardown callback.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display("{self:?}")]
pub enum HookKind {
    /// Executing before all steps of a scenario.
    Before,

    /// Executing after all steps of a scenario.
    After,

    /// Executing before each step.
    BeforeStep,

    /// Executing after each step.
    AfterStep,
}

impl HookKind {
    /// Indicates whether this is a before-flavored hook.
    #[must_use]
    pub const fn is_before(self) -> bool {
        matches!(self, Self::Before | Self::BeforeStep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_display_name() {
        let step = TestStep::Hook(HookStep {
            kind: HookKind::BeforeStep,
            code_location: "steps::setup".into(),
        });
        assert_eq!(step.display_name(), "Hook: BeforeStep");
    }
}
