//! Request payloads of the [`ReportClient`] operations.
//!
//! [`ReportClient`]: super::ReportClient

use std::time::SystemTime;

use derive_more::Display;

use super::ItemId;

/// Type of a report-tree item, as understood by the remote service.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ItemType {
    /// Top-level suite container.
    #[display("SUITE")]
    Suite,

    /// Synthetic user-story container.
    #[display("STORY")]
    Story,

    /// Test container.
    #[display("TEST")]
    Test,

    /// Scenario container.
    #[display("SCENARIO")]
    Scenario,

    /// Leaf step item.
    #[display("STEP")]
    Step,

    /// Before-scenario hook item.
    #[display("BEFORE_TEST")]
    BeforeTest,

    /// After-scenario hook item.
    #[display("AFTER_TEST")]
    AfterTest,

    /// Before-step hook item.
    #[display("BEFORE_METHOD")]
    BeforeMethod,

    /// After-step hook item.
    #[display("AFTER_METHOD")]
    AfterMethod,
}

/// Final status of a finished report-tree item.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ItemStatus {
    /// Item passed.
    #[display("PASSED")]
    Passed,

    /// Item failed.
    #[display("FAILED")]
    Failed,

    /// Item was skipped (or its status is unknown to this crate).
    #[display("SKIPPED")]
    Skipped,
}

/// Severity of a log entry.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational entry.
    #[display("INFO")]
    Info,

    /// Something degraded, execution continued.
    #[display("WARN")]
    Warn,

    /// Failure diagnostics.
    #[display("ERROR")]
    Error,
}

/// Mode a launch is reported in.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq)]
pub enum LaunchMode {
    /// Regular launch.
    #[default]
    #[display("DEFAULT")]
    Default,

    /// Debug launch, hidden from regular listings.
    #[display("DEBUG")]
    Debug,
}

/// Key/value attribute of a launch or an item.
///
/// Tag-derived attributes carry no key; `system` attributes describe the
/// reporting agent itself rather than the tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute key, if any.
    pub key: Option<String>,

    /// Attribute value.
    pub value: String,

    /// Whether this is a system attribute.
    pub system: bool,
}

impl Attribute {
    /// Creates a plain value-only [`Attribute`] out of a Gherkin tag.
    #[must_use]
    pub fn tag(value: impl Into<String>) -> Self {
        Self { key: None, value: value.into(), system: false }
    }

    /// Creates a keyed [`Attribute`].
    #[must_use]
    pub fn keyed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: Some(key.into()), value: value.into(), system: false }
    }

    /// Creates a keyed system [`Attribute`].
    #[must_use]
    pub fn system(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { key: Some(key.into()), value: value.into(), system: true }
    }
}

/// Named parameter of a leaf item (an outline iteration's resolved
/// placeholder, or a positional argument).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub key: String,

    /// Parameter value.
    pub value: String,
}

/// Binary attachment of a log entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    /// Attachment name.
    pub name: String,

    /// Detected or declared content type.
    pub content_type: String,

    /// Raw bytes.
    pub data: Vec<u8>,
}

/// Payload of [`ReportClient::start_launch()`].
///
/// [`ReportClient::start_launch()`]: super::ReportClient::start_launch
#[derive(Clone, Debug)]
pub struct StartLaunchRequest {
    /// Launch name.
    pub name: String,

    /// Frozen start time: sampled when the run actually started, not when
    /// the remote call is issued.
    pub start_time: SystemTime,

    /// Reporting mode of the launch.
    pub mode: LaunchMode,

    /// Launch attributes, including system ones.
    pub attributes: Vec<Attribute>,

    /// Launch description.
    pub description: Option<String>,

    /// Whether this launch is a rerun.
    pub rerun: bool,

    /// Launch this one is a rerun of.
    pub rerun_of: Option<String>,
}

/// Payload of [`ReportClient::start_item()`].
///
/// [`ReportClient::start_item()`]: super::ReportClient::start_item
#[derive(Clone, Debug)]
pub struct StartItemRequest {
    /// Item name.
    pub name: String,

    /// Item description.
    pub description: Option<String>,

    /// Stable code reference (`<path>:<line>` or a definition owner path),
    /// used by the service for cross-run identity matching.
    pub code_ref: Option<String>,

    /// Type of the item.
    pub item_type: ItemType,

    /// Tag-derived and definition-declared attributes.
    pub attributes: Vec<Attribute>,

    /// Explicit test-case identifier.
    pub test_case_id: Option<String>,

    /// Resolved parameters of a leaf item.
    pub parameters: Vec<Parameter>,

    /// Start time of the item.
    pub start_time: SystemTime,
}

impl StartItemRequest {
    /// Creates a minimal [`StartItemRequest`] of the given type.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        item_type: ItemType,
        start_time: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            code_ref: None,
            item_type,
            attributes: Vec::new(),
            test_case_id: None,
            parameters: Vec::new(),
            start_time,
        }
    }
}

/// Payload of [`ReportClient::finish_item()`].
///
/// [`ReportClient::finish_item()`]: super::ReportClient::finish_item
#[derive(Clone, Debug)]
pub struct FinishItemRequest {
    /// End time of the item.
    pub end_time: SystemTime,

    /// Final status; [`None`] lets the service derive it from children.
    pub status: Option<ItemStatus>,
}

/// Payload of [`ReportClient::send_log()`].
///
/// [`ReportClient::send_log()`]: super::ReportClient::send_log
#[derive(Clone, Debug)]
pub struct LogRequest {
    /// Item the entry belongs to; [`None`] attaches it to the launch.
    pub item: Option<ItemId>,

    /// Log message.
    pub message: String,

    /// Severity.
    pub level: LogLevel,

    /// Time of the entry.
    pub time: SystemTime,

    /// Binary attachment, if any.
    pub attachment: Option<Attachment>,
}

/// Payload of [`ReportClient::finish_launch()`].
///
/// [`ReportClient::finish_launch()`]: super::ReportClient::finish_launch
#[derive(Clone, Debug)]
pub struct FinishLaunchRequest {
    /// End time of the launch.
    pub end_time: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_types_render_service_tokens() {
        assert_eq!(ItemType::Suite.to_string(), "SUITE");
        assert_eq!(ItemType::BeforeMethod.to_string(), "BEFORE_METHOD");
        assert_eq!(ItemType::AfterTest.to_string(), "AFTER_TEST");
    }

    #[test]
    fn tag_attribute_has_no_key() {
        let attr = Attribute::tag("@smoke");
        assert_eq!(attr.key, None);
        assert_eq!(attr.value, "@smoke");
        assert!(!attr.system);
    }
}
