//! Rendering of node names, multiline arguments, code references and
//! attachments.

use itertools::Itertools as _;
use lazy_regex::regex;
use mime::Mime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    client::{ItemType, Parameter},
    event::{HookKind, PickleStep, StepArgument},
};

/// Infix between a Gherkin keyword and a node name.
const COLON_INFIX: &str = ": ";

/// Indent of a rendered data-table row.
const TABLE_INDENT: &str = "          ";

/// Decorator wrapped around a rendered doc-string.
const DOCSTRING_DECORATOR: &str = "\n\"\"\"\n";

/// Separator decorating inline step log lines, to distinguish them from
/// real log messages.
const LOG_SEPARATOR: &str = "-------------------------";

/// Line ends of rendered multiline arguments.
const NEW_LINE: &str = "\r\n";

/// Scheme prefix stripped off source URIs in code references.
const FILE_SCHEME: &str = "file:";

/// Builds the display name of a feature or scenario node:
/// `<keyword>: <name>`, plus the outline-iteration label when present.
pub(crate) fn node_name(
    keyword: &str,
    name: &str,
    iteration: Option<&str>,
) -> String {
    let mut out = format!("{keyword}{COLON_INFIX}{name}");
    if let Some(iteration) = iteration {
        out.push(' ');
        out.push_str(iteration);
    }
    out
}

/// Builds the display name of a step: `<prefix><keyword> <text>`.
///
/// The parsed step keyword keeps its trailing whitespace; it is trimmed
/// here so the separator is always a single space.
pub(crate) fn step_name(prefix: &str, keyword: &str, text: &str) -> String {
    format!("{prefix}{} {text}", keyword.trim_end())
}

/// Wraps an inline step log line into separators.
pub(crate) fn decorate(message: &str) -> String {
    format!("{LOG_SEPARATOR}{message}{LOG_SEPARATOR}")
}

/// Renders a step's multiline argument (data table or doc-string), or an
/// empty string if there is none.
pub(crate) fn multiline_argument(argument: Option<&StepArgument>) -> String {
    match argument {
        Some(StepArgument::Table(rows)) => {
            let mut out = String::from(NEW_LINE);
            for row in rows {
                out.push_str(TABLE_INDENT);
                out.push('|');
                for cell in row {
                    out.push(' ');
                    out.push_str(cell);
                    out.push_str(" |");
                }
                out.push_str(NEW_LINE);
            }
            out
        }
        Some(StepArgument::DocString(content)) => {
            format!("{DOCSTRING_DECORATOR}{content}{DOCSTRING_DECORATOR}")
        }
        None => String::new(),
    }
}

/// Builds the `<path>:<line>` code reference of a feature or scenario,
/// stripping the `file:` scheme off the URI.
pub(crate) fn code_ref(uri: &str, line: usize) -> String {
    let path = uri.strip_prefix(FILE_SCHEME).unwrap_or(uri);
    format!("{path}:{line}")
}

/// Test-case identifier of a leaf item: the definition's explicit one,
/// else the code reference, parameterized with the runtime arguments when
/// present.
pub(crate) fn test_case_id(
    step: &PickleStep,
    code_ref: Option<&str>,
) -> Option<String> {
    if let Some(explicit) =
        step.definition.as_ref().and_then(|d| d.test_case_id.clone())
    {
        return Some(explicit);
    }
    code_ref.map(|code_ref| {
        if step.arguments.is_empty() {
            code_ref.to_owned()
        } else {
            format!("{code_ref}[{}]", step.arguments.iter().join(","))
        }
    })
}

/// Resolves the named parameters of a step: `<name>` placeholders of the
/// definition text matched positionally against the runtime arguments;
/// arguments beyond the placeholders become `arg<n>`.
pub(crate) fn step_parameters(
    definition_text: &str,
    arguments: &[String],
) -> Vec<Parameter> {
    /// [`Regex`] matching `<name>` placeholders of an outline step.
    static TEMPLATE_REGEX: &Lazy<Regex> = regex!(r"<([^>\s]+)>");

    let mut names = TEMPLATE_REGEX
        .captures_iter(definition_text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_owned()));

    arguments
        .iter()
        .enumerate()
        .map(|(i, value)| Parameter {
            key: names.next().unwrap_or_else(|| format!("arg{i}")),
            value: value.clone(),
        })
        .collect()
}

/// Display name and item type of a hook node.
pub(crate) fn hook_item(kind: HookKind) -> (&'static str, ItemType) {
    match kind {
        HookKind::Before => ("Before hooks", ItemType::BeforeTest),
        HookKind::After => ("After hooks", ItemType::AfterTest),
        HookKind::BeforeStep => ("Before step", ItemType::BeforeMethod),
        HookKind::AfterStep => ("After step", ItemType::AfterMethod),
    }
}

/// Detects the content type of an attachment: the explicit hint when it
/// parses, else magic-byte sniffing, else `application/octet-stream`.
pub(crate) fn detect_content_type(
    hint: Option<&str>,
    data: &[u8],
) -> Mime {
    if let Some(hint) = hint {
        match hint.parse::<Mime>() {
            Ok(mime) => return mime,
            Err(e) => {
                tracing::warn!(hint, error = %e, "unrecognized mime type");
            }
        }
    }
    sniff_content_type(data)
}

fn sniff_content_type(data: &[u8]) -> Mime {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        mime::IMAGE_PNG
    } else if data.starts_with(b"\xFF\xD8\xFF") {
        mime::IMAGE_JPEG
    } else if data.starts_with(b"GIF8") {
        mime::IMAGE_GIF
    } else if data.starts_with(b"%PDF") {
        mime::APPLICATION_PDF
    } else if std::str::from_utf8(data).is_ok() {
        mime::TEXT_PLAIN
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

/// Derives an attachment name out of its content type: the top-level mime
/// type (`image`, `text`, …).
pub(crate) fn attachment_name(mime: &Mime) -> String {
    mime.type_().as_str().to_owned()
}

#[cfg(test)]
mod tests {
    use crate::event::StepDefinition;

    use super::*;

    #[test]
    fn node_name_appends_iteration_label() {
        assert_eq!(node_name("Feature", "Login", None), "Feature: Login");
        assert_eq!(
            node_name("Scenario Outline", "Attempt", Some("[2]")),
            "Scenario Outline: Attempt [2]",
        );
    }

    #[test]
    fn step_name_carries_background_prefix() {
        assert_eq!(
            step_name("BACKGROUND: ", "Given", "a clean session"),
            "BACKGROUND: Given a clean session",
        );
        assert_eq!(step_name("", "When", "I sign in"), "When I sign in");
    }

    #[test]
    fn renders_data_table() {
        let arg = StepArgument::Table(vec![
            vec!["name".into(), "role".into()],
            vec!["bob".into(), "admin".into()],
        ]);
        assert_eq!(
            multiline_argument(Some(&arg)),
            "\r\n          | name | role |\r\n          | bob | admin |\r\n",
        );
    }

    #[test]
    fn renders_docstring() {
        let arg = StepArgument::DocString("payload".into());
        assert_eq!(
            multiline_argument(Some(&arg)),
            "\n\"\"\"\npayload\n\"\"\"\n",
        );
    }

    #[test]
    fn code_ref_strips_file_scheme() {
        assert_eq!(
            code_ref("file:features/login.feature", 5),
            "features/login.feature:5",
        );
        assert_eq!(code_ref("features/a.feature", 7), "features/a.feature:7");
    }

    #[test]
    fn parameters_match_placeholders_positionally() {
        let params = step_parameters(
            "a user named <name> with <role>",
            &["bob".into(), "admin".into(), "extra".into()],
        );
        assert_eq!(
            params,
            vec![
                Parameter { key: "name".into(), value: "bob".into() },
                Parameter { key: "role".into(), value: "admin".into() },
                Parameter { key: "arg2".into(), value: "extra".into() },
            ],
        );
    }

    #[test]
    fn test_case_id_prefers_explicit_then_parameterized_code_ref() {
        let mut step = PickleStep {
            line: 3,
            text: "I add 1 and 2".into(),
            arguments: vec!["1".into(), "2".into()],
            argument: None,
            definition: Some(StepDefinition {
                code_ref: Some("steps::math::add".into()),
                test_case_id: Some("TC-42".into()),
                attributes: Vec::new(),
            }),
        };
        assert_eq!(
            test_case_id(&step, Some("steps::math::add")),
            Some("TC-42".into()),
        );

        step.definition = None;
        assert_eq!(
            test_case_id(&step, Some("steps::math::add")),
            Some("steps::math::add[1,2]".into()),
        );

        step.arguments.clear();
        assert_eq!(
            test_case_id(&step, Some("steps::math::add")),
            Some("steps::math::add".into()),
        );
        assert_eq!(test_case_id(&step, None), None);
    }

    #[test]
    fn sniffs_common_attachment_types() {
        assert_eq!(
            detect_content_type(None, b"\x89PNG\r\n\x1a\nrest"),
            mime::IMAGE_PNG,
        );
        assert_eq!(detect_content_type(None, b"plain text"), mime::TEXT_PLAIN);
        assert_eq!(
            detect_content_type(None, &[0xde, 0xad, 0xbe, 0xef]),
            mime::APPLICATION_OCTET_STREAM,
        );
        // An explicit hint wins over the payload.
        assert_eq!(
            detect_content_type(Some("image/jpeg"), b"not a jpeg"),
            mime::IMAGE_JPEG,
        );
        // An unparsable hint falls back to sniffing.
        assert_eq!(
            detect_content_type(Some("not a mime"), b"text"),
            mime::TEXT_PLAIN,
        );
    }

    #[test]
    fn attachment_names_use_the_top_level_type() {
        assert_eq!(attachment_name(&mime::IMAGE_PNG), "image");
        assert_eq!(attachment_name(&mime::APPLICATION_OCTET_STREAM), "application");
    }
}
