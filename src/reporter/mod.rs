// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reporter state machine: drives creation and completion of report-tree
//! nodes out of the runner's event stream.
//!
//! Per scenario the machine walks `NotStarted → FeatureOpen → ScenarioOpen
//! → {StepOpen | HookOpen}* → ScenarioClosed`. A feature stays open across
//! every scenario sharing its URI: the runner emits no "feature ended"
//! event, so the machine records the last scenario-finish time per URI and
//! closes all still-open features with those times when the run finishes.

mod formatting;
pub mod mode;
mod status;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    thread::{self, ThreadId},
    time::SystemTime,
};

use once_cell::sync::OnceCell;
use smart_default::SmartDefault;

use crate::{
    client::{
        Attachment, Attribute, FinishItemRequest, FinishLaunchRequest,
        ItemId, ItemStatus, ItemType, LaunchId, LaunchMode, LogLevel,
        LogRequest, ReportClient, StartItemRequest, StartLaunchRequest,
    },
    context::{FeatureContext, OutlineIndex, ScenarioContext},
    error::{Error, Result},
    event::{
        Embedding, Event, HookStep, PickleStep, RunnerEvent, StepOutcome,
        TestCase, TestStep,
    },
    source::SourceIndex,
    sync::lock,
};

pub use self::mode::ReportingMode;

/// Launch-level configuration of a [`Reporter`].
#[derive(Clone, Debug, SmartDefault)]
pub struct LaunchConfig {
    /// Name of the reported launch.
    #[default = "cucumber-relay run"]
    pub name: String,

    /// Description of the launch.
    pub description: Option<String>,

    /// Mode of the launch.
    pub mode: LaunchMode,

    /// User-supplied launch attributes.
    pub attributes: Vec<Attribute>,

    /// Whether this launch is a rerun.
    pub rerun: bool,

    /// Launch this one is a rerun of.
    pub rerun_of: Option<String>,

    /// Value of the `skippedIssue` system attribute: whether skipped items
    /// should not be marked as "to investigate" by the service. [`None`]
    /// omits the attribute.
    #[default(Some(true))]
    pub skipped_an_issue: Option<bool>,
}

/// Reporter of runner lifecycle events to a remote [`ReportClient`].
///
/// Process-wide state: created at runner startup, fed every event of every
/// worker thread, torn down after `RunFinished`. All handlers are cheap and
/// non-blocking; remote calls are fire-and-forget through the client seam.
#[derive(Debug)]
pub struct Reporter<C> {
    client: C,
    mode: ReportingMode,
    config: LaunchConfig,
    sources: SourceIndex,
    outlines: OutlineIndex,

    launch: OnceCell<LaunchId>,
    root_item: OnceCell<Option<ItemId>>,

    features: Mutex<HashMap<String, Arc<FeatureContext>>>,
    scenarios: Mutex<HashMap<(usize, String), Arc<ScenarioContext>>>,
    workers: Mutex<HashMap<ThreadId, Arc<ScenarioContext>>>,

    // The runner has no "feature ended" event: the latest scenario-finish
    // time per URI becomes the feature's end time at the run-end flush.
    feature_finish: Mutex<HashMap<String, SystemTime>>,
}

impl<C: ReportClient> Reporter<C> {
    /// Creates a [`Reporter`] with the default [`LaunchConfig`].
    #[must_use]
    pub fn new(client: C, mode: ReportingMode) -> Self {
        Self::with_config(client, mode, LaunchConfig::default())
    }

    /// Creates a [`Reporter`] with the given [`LaunchConfig`].
    #[must_use]
    pub fn with_config(
        client: C,
        mode: ReportingMode,
        config: LaunchConfig,
    ) -> Self {
        Self {
            client,
            mode,
            config,
            sources: SourceIndex::new(),
            outlines: OutlineIndex::new(),
            launch: OnceCell::new(),
            root_item: OnceCell::new(),
            features: Mutex::new(HashMap::new()),
            scenarios: Mutex::new(HashMap::new()),
            workers: Mutex::new(HashMap::new()),
            feature_finish: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one runner lifecycle event.
    ///
    /// Must be called on the worker thread the runner delivered the event
    /// on: step and hook events carry no scenario reference and are routed
    /// to the scenario currently pinned to the calling thread.
    ///
    /// # Errors
    ///
    /// On protocol violations (see [`Error`]); the relay cannot safely
    /// continue reporting after one.
    pub fn handle_event(&self, event: Event<RunnerEvent>) -> Result<()> {
        let at = event.at;
        match event.value {
            RunnerEvent::RunStarted => {
                self.run_started(at);
                Ok(())
            }
            RunnerEvent::SourceRead(source) => {
                self.sources.record_source(source.uri, source.source);
                Ok(())
            }
            RunnerEvent::TestCaseStarted(test_case) => {
                self.test_case_started(&test_case, at)
            }
            RunnerEvent::TestStepStarted(step) => {
                self.test_step_started(&step, at)
            }
            RunnerEvent::TestStepFinished(step, outcome) => {
                self.test_step_finished(&step, &outcome, at)
            }
            RunnerEvent::TestCaseFinished(outcome) => {
                self.test_case_finished(&outcome, at)
            }
            RunnerEvent::RunFinished => {
                self.run_finished(at);
                Ok(())
            }
            RunnerEvent::Embed(embedding) => {
                self.embedding(embedding, at);
                Ok(())
            }
            RunnerEvent::Write(text) => {
                self.write(text, at);
                Ok(())
            }
        }
    }

    /// Starts the launch (and the synthetic root container, if the mode
    /// uses one), exactly once per run.
    ///
    /// The launch start time is the event's own time: the remote call may
    /// be delayed or retried by the client, but the reported start must
    /// reflect when the run actually began.
    fn run_started(&self, at: SystemTime) {
        let _ = self.launch.get_or_init(|| {
            self.client.start_launch(self.launch_request(at))
        });
        let _ = self.root_item.get_or_init(|| {
            self.mode.synthetic_root.map(|name| {
                self.client.start_item(
                    None,
                    StartItemRequest::new(name, ItemType::Story, at),
                )
            })
        });
    }

    fn launch_request(&self, at: SystemTime) -> StartLaunchRequest {
        let mut attributes = self.config.attributes.clone();
        attributes.push(Attribute::system(
            "agent",
            concat!(env!("CARGO_PKG_NAME"), "|", env!("CARGO_PKG_VERSION")),
        ));
        if let Some(skipped) = self.config.skipped_an_issue {
            attributes
                .push(Attribute::system("skippedIssue", skipped.to_string()));
        }
        StartLaunchRequest {
            name: self.config.name.clone(),
            start_time: at,
            mode: self.config.mode,
            attributes,
            description: self.config.description.clone(),
            rerun: self.config.rerun,
            rerun_of: self.config.rerun_of.clone(),
        }
    }

    /// Opens the feature (first scenario of its URI only) and the scenario,
    /// and pins the scenario to the calling worker thread.
    fn test_case_started(
        &self,
        test_case: &TestCase,
        at: SystemTime,
    ) -> Result<()> {
        if self.launch.get().is_none() {
            return Err(Error::LaunchNotStarted);
        }
        let document = self.sources.document(&test_case.uri)?;

        let feature_ctx = {
            // The remote start happens inside the critical section, so two
            // scenarios racing on a fresh URI cannot both open the feature.
            let mut features = lock(&self.features);
            match features.get(&test_case.uri) {
                Some(ctx) => Arc::clone(ctx),
                None => {
                    let ctx = Arc::new(FeatureContext::new(document)?);
                    let feature = ctx.feature()?;
                    let request = StartItemRequest {
                        name: formatting::node_name(
                            &feature.keyword,
                            &feature.name,
                            None,
                        ),
                        description: Some(test_case.uri.clone()),
                        code_ref: Some(formatting::code_ref(
                            &test_case.uri,
                            feature.position.line,
                        )),
                        item_type: self.mode.feature_item_type,
                        attributes: ctx.attributes().to_vec(),
                        test_case_id: None,
                        parameters: Vec::new(),
                        start_time: at,
                    };
                    let parent = self.root_item.get().cloned().flatten();
                    ctx.assign_item(
                        self.client.start_item(parent.as_ref(), request),
                    );
                    features
                        .insert(test_case.uri.clone(), Arc::clone(&ctx));
                    ctx
                }
            }
        };

        if feature_ctx.uri() != test_case.uri {
            return Err(Error::UriMismatch {
                scenario_uri: test_case.uri.clone(),
                feature_uri: feature_ctx.uri().to_owned(),
            });
        }

        let key = (test_case.line, test_case.uri.clone());
        let scenario_ctx = {
            let mut scenarios = lock(&self.scenarios);
            match scenarios.get(&key) {
                Some(ctx) => Arc::clone(ctx),
                None => {
                    let ctx = Arc::new(
                        feature_ctx
                            .scenario_context(test_case, &self.outlines)?,
                    );
                    scenarios.insert(key, Arc::clone(&ctx));
                    ctx
                }
            }
        };
        lock(&self.workers)
            .insert(thread::current().id(), Arc::clone(&scenario_ctx));

        let code_ref =
            formatting::code_ref(&test_case.uri, scenario_ctx.line());
        let request = StartItemRequest {
            name: formatting::node_name(
                scenario_ctx.keyword(),
                scenario_ctx.name(),
                scenario_ctx.outline_iteration(),
            ),
            description: scenario_ctx.description().map(Into::into),
            code_ref: Some(code_ref.clone()),
            item_type: self.mode.scenario_item_type,
            attributes: scenario_ctx.attributes().to_vec(),
            test_case_id: (self.mode.scenario_item_type == ItemType::Step)
                .then(|| code_ref.clone()),
            parameters: Vec::new(),
            start_time: at,
        };
        let id = self.client.start_item(feature_ctx.item(), request);
        scenario_ctx.assign_item(id)
    }

    fn test_step_started(
        &self,
        step: &TestStep,
        at: SystemTime,
    ) -> Result<()> {
        let ctx = self.current_scenario()?;
        match step {
            TestStep::Hook(hook) => self.hook_started(&ctx, hook, at),
            TestStep::Pickle(pickle) => {
                self.gherkin_step_started(&ctx, pickle, at)?;
            }
        }
        Ok(())
    }

    fn hook_started(
        &self,
        ctx: &ScenarioContext,
        hook: &HookStep,
        at: SystemTime,
    ) {
        if self.mode.inline_steps {
            // Hooks contribute log entries only; no dedicated item.
            return;
        }
        let (name, item_type) = formatting::hook_item(hook.kind);
        let id = self.client.start_item(
            ctx.item().as_ref(),
            StartItemRequest::new(name, item_type, at),
        );
        ctx.begin_hook(id);
    }

    fn gherkin_step_started(
        &self,
        ctx: &ScenarioContext,
        pickle: &PickleStep,
        at: SystemTime,
    ) -> Result<()> {
        // The prefix reflects the queue before this step consumes its
        // entry, so every background step carries it.
        let prefix = ctx.step_prefix();
        if ctx.has_pending_background() {
            ctx.next_background_step();
        }
        let ast_step = ctx.step(pickle.line)?;
        let name =
            formatting::step_name(&prefix, &ast_step.keyword, &pickle.text);
        let multiline =
            formatting::multiline_argument(pickle.argument.as_ref());

        if self.mode.inline_steps {
            self.send_log(
                ctx.active_item(),
                format!("{}{multiline}", formatting::decorate(&name)),
                LogLevel::Info,
                at,
            );
            return Ok(());
        }

        let code_ref = pickle
            .definition
            .as_ref()
            .and_then(|def| def.code_ref.clone());
        let request = StartItemRequest {
            name,
            description: (!multiline.is_empty()).then_some(multiline),
            code_ref: code_ref.clone(),
            item_type: ItemType::Step,
            attributes: pickle
                .definition
                .as_ref()
                .map(|def| def.attributes.clone())
                .unwrap_or_default(),
            test_case_id: formatting::test_case_id(
                pickle,
                code_ref.as_deref(),
            ),
            parameters: formatting::step_parameters(
                &ast_step.value,
                &pickle.arguments,
            ),
            start_time: at,
        };
        let id = self.client.start_item(ctx.item().as_ref(), request);
        ctx.begin_step(id);
        Ok(())
    }

    fn test_step_finished(
        &self,
        step: &TestStep,
        outcome: &StepOutcome,
        at: SystemTime,
    ) -> Result<()> {
        let ctx = self.current_scenario()?;
        match step {
            TestStep::Hook(hook) => {
                let side =
                    if hook.kind.is_before() { "Before" } else { "After" };
                self.report_result(
                    &ctx,
                    outcome,
                    Some(format!("{side} hook: {}", hook.code_location)),
                    at,
                );
                if !self.mode.inline_steps {
                    ctx.record_hook_status(status::item_status(
                        &outcome.status,
                    ));
                    match ctx.end_hook() {
                        Some((id, hook_status)) => self.finish_item(
                            Some(id),
                            Some(hook_status),
                            at,
                        ),
                        None => self.finish_item(None, None, at),
                    }
                }
            }
            TestStep::Pickle(_) => {
                if self.mode.inline_steps {
                    let line = formatting::decorate(&format!(
                        "STEP {}",
                        outcome.status.to_string().to_uppercase(),
                    ));
                    self.report_result(&ctx, outcome, Some(line), at);
                } else {
                    self.report_result(&ctx, outcome, None, at);
                    self.finish_item(
                        ctx.end_step(),
                        Some(status::item_status(&outcome.status)),
                        at,
                    );
                }
            }
        }
        Ok(())
    }

    /// Finishes the scenario item and records its finish time as the
    /// feature's provisional end time.
    fn test_case_finished(
        &self,
        outcome: &StepOutcome,
        at: SystemTime,
    ) -> Result<()> {
        let ctx = lock(&self.workers)
            .remove(&thread::current().id())
            .ok_or(Error::NoRunningScenario)?;
        self.finish_item(
            ctx.item(),
            Some(status::item_status(&outcome.status)),
            at,
        );
        {
            // Keep the latest finish time, not the last processed one:
            // workers may deliver finishes out of timestamp order.
            let mut times = lock(&self.feature_finish);
            let entry = times.entry(ctx.uri().to_owned()).or_insert(at);
            if at > *entry {
                *entry = at;
            }
        }
        lock(&self.scenarios)
            .remove(&(ctx.line(), ctx.uri().to_owned()));
        Ok(())
    }

    /// Flushes every still-open feature, then the synthetic root, then the
    /// launch.
    fn run_finished(&self, at: SystemTime) {
        let features: Vec<_> =
            lock(&self.features).drain().collect();
        let finish_times = {
            let mut times = lock(&self.feature_finish);
            std::mem::take(&mut *times)
        };
        for (uri, ctx) in features {
            // A feature with no finished scenario has no recorded time;
            // the run end is the best remaining approximation.
            let end = finish_times.get(&uri).copied().unwrap_or(at);
            self.finish_item(ctx.item().cloned(), None, end);
        }

        if let Some(Some(root)) = self.root_item.get() {
            self.client.finish_item(
                root,
                FinishItemRequest { end_time: at, status: None },
            );
        }
        match self.launch.get() {
            Some(launch) => self.client.finish_launch(
                launch,
                FinishLaunchRequest { end_time: at },
            ),
            None => tracing::warn!(
                "run finished without a started launch, nothing to finish",
            ),
        }
    }

    /// Logs an inline attachment against the innermost open item.
    fn embedding(&self, embedding: Embedding, at: SystemTime) {
        let item = self.active_item();
        let mime = formatting::detect_content_type(
            embedding.content_type.as_deref(),
            &embedding.data,
        );
        let name = embedding
            .name
            .unwrap_or_else(|| formatting::attachment_name(&mime));
        self.client.send_log(LogRequest {
            item,
            message: name.clone(),
            level: LogLevel::Info,
            time: at,
            attachment: Some(Attachment {
                name,
                content_type: mime.to_string(),
                data: embedding.data,
            }),
        });
    }

    /// Logs free text against the innermost open item.
    fn write(&self, text: String, at: SystemTime) {
        let item = self.active_item();
        self.send_log(item, text, LogLevel::Info, at);
    }

    /// Logs a step/hook result: the error diagnostics (if any) and an
    /// optional extra message, both at the status-derived severity.
    fn report_result(
        &self,
        ctx: &ScenarioContext,
        outcome: &StepOutcome,
        message: Option<String>,
        at: SystemTime,
    ) {
        let level = status::log_level(&outcome.status);
        if let Some(error) = &outcome.error_message {
            self.send_log(ctx.active_item(), error.clone(), level, at);
        }
        if let Some(message) = message {
            self.send_log(ctx.active_item(), message, level, at);
        }
    }

    fn send_log(
        &self,
        item: Option<ItemId>,
        message: String,
        level: LogLevel,
        at: SystemTime,
    ) {
        self.client.send_log(LogRequest {
            item,
            message,
            level,
            time: at,
            attachment: None,
        });
    }

    fn finish_item(
        &self,
        item: Option<ItemId>,
        item_status: Option<ItemStatus>,
        at: SystemTime,
    ) {
        match item {
            Some(id) => self.client.finish_item(
                &id,
                FinishItemRequest { end_time: at, status: item_status },
            ),
            None => {
                tracing::error!("BUG: trying to finish an unspecified item");
            }
        }
    }

    fn current_scenario(&self) -> Result<Arc<ScenarioContext>> {
        lock(&self.workers)
            .get(&thread::current().id())
            .cloned()
            .ok_or(Error::NoRunningScenario)
    }

    fn active_item(&self) -> Option<ItemId> {
        self.current_scenario()
            .ok()
            .and_then(|ctx| ctx.active_item())
    }
}
