// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Running context: reconstruction of the Feature → Scenario → Step/Hook
//! tree out of the runner's flat event stream.
//!
//! A [`FeatureContext`] lives as long as any scenario of its URI may still
//! report into it (the runner has no "feature ended" event); a
//! [`ScenarioContext`] lives from its `TestCaseStarted` event to its
//! `TestCaseFinished` one and carries the mutable slots the step/hook
//! events of its worker thread operate on.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use once_cell::sync::OnceCell;

use crate::{
    client::{Attribute, ItemId, ItemStatus},
    error::{Error, Result},
    event::TestCase,
    source::{example_row_lines, SourceDocument},
    sync::lock,
};

/// Registry of outline-definition → ordered example-row lines.
///
/// Populated lazily, exactly once per distinct outline definition
/// (first-writer-wins); reads afterwards are lock-free on the shared row
/// list. The iteration label of a runtime row is its 1-based position in
/// the list, which makes numbering deterministic no matter which worker
/// executes which row first.
#[derive(Debug, Default)]
pub struct OutlineIndex {
    rows: Mutex<HashMap<(String, usize), Arc<Vec<usize>>>>,
}

impl OutlineIndex {
    /// Creates an empty [`OutlineIndex`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iteration label (`[n]`, 1-based) of the outline row at `row_line`,
    /// or [`None`] if `scenario` is not an outline.
    #[must_use]
    pub fn iteration_label(
        &self,
        uri: &str,
        scenario: &gherkin::Scenario,
        row_line: usize,
    ) -> Option<String> {
        if scenario.examples.is_empty() {
            return None;
        }
        let rows = {
            let mut map = lock(&self.rows);
            Arc::clone(
                map.entry((uri.to_owned(), scenario.position.line))
                    .or_insert_with(|| {
                        Arc::new(example_row_lines(scenario).collect())
                    }),
            )
        };
        rows.iter()
            .position(|l| *l == row_line)
            .map(|i| format!("[{}]", i + 1))
    }
}

/// Per-feature reporting state, keyed by source URI.
#[derive(Debug)]
pub struct FeatureContext {
    uri: String,
    document: Arc<SourceDocument>,
    attributes: Vec<Attribute>,
    item: OnceCell<ItemId>,
}

impl FeatureContext {
    /// Builds a [`FeatureContext`] over the given recorded document.
    ///
    /// # Errors
    ///
    /// If the document is unparsable (the preserved parse diagnostics are
    /// surfaced).
    pub fn new(document: Arc<SourceDocument>) -> Result<Self> {
        let feature = document.feature()?;
        let attributes =
            feature.tags.iter().map(|t| Attribute::tag(t.as_str())).collect();
        Ok(Self {
            uri: document.uri().to_owned(),
            document,
            attributes,
            item: OnceCell::new(),
        })
    }

    /// URI this feature context is keyed by.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Parsed feature of the underlying document.
    ///
    /// # Errors
    ///
    /// Never after successful construction; kept fallible to avoid
    /// panicking on the shared document.
    pub fn feature(&self) -> Result<&gherkin::Feature> {
        self.document.feature()
    }

    /// Tag-derived attributes of the feature.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Stores the remotely-assigned item of this feature.
    ///
    /// The id is assigned exactly once, by whichever worker created the
    /// context; a second assignment indicates a bug and is logged, not
    /// applied.
    pub fn assign_item(&self, id: ItemId) {
        if self.item.set(id).is_err() {
            tracing::error!(
                uri = %self.uri,
                "BUG: feature item has already been assigned",
            );
        }
    }

    /// Remotely-assigned item of this feature, once assigned.
    #[must_use]
    pub fn item(&self) -> Option<&ItemId> {
        self.item.get()
    }

    /// Builds the [`ScenarioContext`] of a runtime test case belonging to
    /// this feature.
    ///
    /// # Errors
    ///
    /// If the test case cannot be resolved against the document.
    pub fn scenario_context(
        &self,
        test_case: &TestCase,
        outlines: &OutlineIndex,
    ) -> Result<ScenarioContext> {
        let scenario = self
            .document
            .resolve_scenario(test_case.line, &test_case.name)?;
        Ok(ScenarioContext::build(
            &self.document,
            scenario,
            test_case,
            outlines,
        ))
    }
}

/// Accumulated state of the currently open hook item.
#[derive(Debug)]
struct HookSlot {
    item: ItemId,
    status: ItemStatus,
}

/// Mutable slots of a [`ScenarioContext`].
///
/// A scenario's step and hook events execute strictly sequentially on its
/// owning worker thread, so this lock is uncontended; it exists to publish
/// the slots safely through the concurrent scenario map.
#[derive(Debug, Default)]
struct ScenarioState {
    background: VecDeque<gherkin::Step>,
    item: Option<ItemId>,
    step: Option<ItemId>,
    hook: Option<HookSlot>,
}

/// Per-test-case reporting state.
///
/// Constructed once per runtime test case (one per outline example row),
/// released when the test case finishes.
#[derive(Debug)]
pub struct ScenarioContext {
    uri: String,
    name: String,
    keyword: String,
    description: Option<String>,
    line: usize,
    outline_iteration: Option<String>,
    background_keyword: Option<String>,
    attributes: Vec<Attribute>,
    steps_by_line: HashMap<usize, gherkin::Step>,
    state: Mutex<ScenarioState>,
}

impl ScenarioContext {
    fn build(
        document: &SourceDocument,
        scenario: &gherkin::Scenario,
        test_case: &TestCase,
        outlines: &OutlineIndex,
    ) -> Self {
        let is_outline = !scenario.examples.is_empty();
        let line =
            if is_outline { test_case.line } else { scenario.position.line };
        let outline_iteration = outlines.iteration_label(
            &test_case.uri,
            scenario,
            test_case.line,
        );

        let background = document.background();
        let mut steps_by_line: HashMap<_, _> = scenario
            .steps
            .iter()
            .chain(background.iter().flat_map(|bg| bg.steps.iter()))
            .map(|step| (step.position.line, step.clone()))
            .collect();
        steps_by_line.shrink_to_fit();

        Self {
            uri: test_case.uri.clone(),
            name: scenario.name.clone(),
            keyword: scenario.keyword.clone(),
            description: scenario.description.clone(),
            line,
            outline_iteration,
            background_keyword: background.map(|bg| bg.keyword.clone()),
            // Attributes come from the runtime tag list, not the static
            // AST one: outline rows may carry per-row tags.
            attributes: test_case
                .tags
                .iter()
                .map(|t| Attribute::tag(t.as_str()))
                .collect(),
            steps_by_line,
            state: Mutex::new(ScenarioState {
                background: background
                    .map(|bg| bg.steps.iter().cloned().collect())
                    .unwrap_or_default(),
                ..ScenarioState::default()
            }),
        }
    }

    /// URI of the owning feature.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Scenario name, as defined in the source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scenario keyword (`Scenario`, `Scenario Outline`, localized
    /// equivalents).
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Free-text description under the scenario header, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Resolved source line: the example-row line for an outline iteration,
    /// the definition's own line otherwise.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Outline-iteration label (`[n]`), if this is an outline iteration.
    #[must_use]
    pub fn outline_iteration(&self) -> Option<&str> {
        self.outline_iteration.as_deref()
    }

    /// Tag-derived attributes of the runtime test case.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// AST step sitting at the given source `line` (own or background
    /// step).
    ///
    /// # Errors
    ///
    /// If the line maps to no step of this scenario.
    pub fn step(&self, line: usize) -> Result<gherkin::Step> {
        self.steps_by_line.get(&line).cloned().ok_or_else(|| {
            Error::StepNotFound { scenario: self.name.clone(), line }
        })
    }

    /// Structural prefix of the next reported step: the background keyword
    /// while background steps are still being consumed, nothing afterwards.
    #[must_use]
    pub fn step_prefix(&self) -> String {
        let state = lock(&self.state);
        if state.background.is_empty() {
            String::new()
        } else {
            self.background_keyword
                .as_deref()
                .map(|kw| format!("{}: ", kw.trim_end().to_uppercase()))
                .unwrap_or_default()
        }
    }

    /// Whether background steps are still pending.
    #[must_use]
    pub fn has_pending_background(&self) -> bool {
        !lock(&self.state).background.is_empty()
    }

    /// Consumes one pending background step; no-op once the queue is
    /// empty.
    pub fn next_background_step(&self) {
        lock(&self.state).background.pop_front();
    }

    /// Stores the remotely-assigned item of this scenario.
    ///
    /// # Errors
    ///
    /// If an item has already been assigned: a context is never reused
    /// across runtime test cases, so a second assignment is an invariant
    /// violation.
    pub fn assign_item(&self, id: ItemId) -> Result<()> {
        let mut state = lock(&self.state);
        if state.item.is_some() {
            return Err(Error::ItemAlreadyAssigned {
                scenario: self.name.clone(),
            });
        }
        state.item = Some(id);
        Ok(())
    }

    /// Remotely-assigned item of this scenario, once assigned.
    #[must_use]
    pub fn item(&self) -> Option<ItemId> {
        lock(&self.state).item.clone()
    }

    /// Registers the currently open step item.
    pub fn begin_step(&self, id: ItemId) {
        lock(&self.state).step = Some(id);
    }

    /// Clears and returns the currently open step item.
    pub fn end_step(&self) -> Option<ItemId> {
        lock(&self.state).step.take()
    }

    /// Registers the currently open hook item with an optimistic `PASSED`
    /// status.
    pub fn begin_hook(&self, id: ItemId) {
        lock(&self.state).hook =
            Some(HookSlot { item: id, status: ItemStatus::Passed });
    }

    /// Updates the accumulated status of the currently open hook.
    pub fn record_hook_status(&self, status: ItemStatus) {
        if let Some(hook) = lock(&self.state).hook.as_mut() {
            hook.status = status;
        }
    }

    /// Clears and returns the currently open hook item with its
    /// accumulated status.
    pub fn end_hook(&self) -> Option<(ItemId, ItemStatus)> {
        lock(&self.state)
            .hook
            .take()
            .map(|hook| (hook.item, hook.status))
    }

    /// Innermost open item of this scenario: the open step, else the open
    /// hook, else the scenario itself.
    ///
    /// Attachments and free-text writes land here.
    #[must_use]
    pub fn active_item(&self) -> Option<ItemId> {
        let state = lock(&self.state);
        state
            .step
            .clone()
            .or_else(|| state.hook.as_ref().map(|h| h.item.clone()))
            .or_else(|| state.item.clone())
    }
}
