// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Index of parsed `.feature` sources, keyed by their URI.
//!
//! The runner announces every source file it reads with a `SourceRead`
//! event before any of the file's test cases start; this module parses each
//! announcement once and answers the "which definition does this runtime
//! handle correspond to" lookups everything else is built on.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use gherkin::GherkinEnv;

use crate::{
    error::{Error, Result},
    sync::lock,
};

/// One recorded `.feature` source: raw text plus its parse outcome.
///
/// Immutable once constructed; re-recording a URI replaces the whole
/// document rather than mutating it.
#[derive(Debug)]
pub struct SourceDocument {
    uri: String,
    raw: String,
    feature: std::result::Result<gherkin::Feature, String>,
}

impl SourceDocument {
    fn parse(uri: String, raw: String) -> Self {
        let feature = gherkin::Feature::parse(&raw, GherkinEnv::default())
            .map_err(|e| e.to_string());
        if let Err(message) = &feature {
            tracing::warn!(%uri, %message, "failed to parse feature source");
        }
        Self { uri, raw, feature }
    }

    /// URI this document was recorded under.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Raw Gherkin text of this document.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed feature of this document.
    ///
    /// # Errors
    ///
    /// If the source failed to parse when it was recorded; the error carries
    /// the preserved parser diagnostics.
    pub fn feature(&self) -> Result<&gherkin::Feature> {
        self.feature.as_ref().map_err(|message| {
            Error::UnparsableSource {
                uri: self.uri.clone(),
                message: message.clone(),
            }
        })
    }

    /// Background block of this document's feature, if any.
    #[must_use]
    pub fn background(&self) -> Option<&gherkin::Background> {
        self.feature.as_ref().ok().and_then(|f| f.background.as_ref())
    }

    /// Resolves the scenario definition a runtime test case originates
    /// from.
    ///
    /// A plain scenario matches by its own `line` and `name`; an outline
    /// iteration matches by the example-table row `line` (the runtime name
    /// has placeholders resolved, so it cannot be compared against the
    /// definition).
    ///
    /// # Errors
    ///
    /// If the document is unparsable, or no definition matches: every
    /// runtime test case must originate from an already-indexed source.
    pub fn resolve_scenario(
        &self,
        line: usize,
        name: &str,
    ) -> Result<&gherkin::Scenario> {
        let feature = self.feature()?;
        feature
            .scenarios
            .iter()
            .find(|sc| {
                (sc.position.line == line && sc.name == name)
                    || (!sc.examples.is_empty()
                        && example_row_lines(sc).any(|l| l == line))
            })
            .ok_or_else(|| Error::ScenarioNotFound {
                uri: self.uri.clone(),
                name: name.to_owned(),
                line,
            })
    }
}

/// Source lines of every example-table body row of an outline, in document
/// order across all of its `Examples` blocks.
///
/// A block's table starts right under its `Examples:` keyword, the first
/// row being the header, so body row `i` sits at `keyword line + 2 + i`.
pub(crate) fn example_row_lines(
    scenario: &gherkin::Scenario,
) -> impl Iterator<Item = usize> + '_ {
    scenario.examples.iter().flat_map(|ex| {
        let body_rows =
            ex.table.as_ref().map_or(0, |t| t.rows.len().saturating_sub(1));
        (0..body_rows).map(move |i| ex.position.line + 2 + i)
    })
}

/// Cache of [`SourceDocument`]s, keyed by source URI.
#[derive(Debug, Default)]
pub struct SourceIndex {
    documents: Mutex<HashMap<String, Arc<SourceDocument>>>,
}

impl SourceIndex {
    /// Creates an empty [`SourceIndex`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and stores `raw` under `uri`, replacing any prior entry.
    ///
    /// Parse failures are recorded, not raised: the stored document keeps
    /// the parser diagnostics and surfaces them from every later
    /// resolution against it.
    pub fn record_source(
        &self,
        uri: impl Into<String>,
        raw: impl Into<String>,
    ) {
        let uri = uri.into();
        let doc = Arc::new(SourceDocument::parse(uri.clone(), raw.into()));
        lock(&self.documents).insert(uri, doc);
    }

    /// Looks up the document recorded under `uri`.
    ///
    /// # Errors
    ///
    /// If no `SourceRead` event has been recorded for `uri`.
    pub fn document(&self, uri: &str) -> Result<Arc<SourceDocument>> {
        lock(&self.documents).get(uri).cloned().ok_or_else(|| {
            Error::UnknownSource { uri: uri.to_owned() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_FEATURE: &str = "\
Feature: Login
  Background:
    Given a clean session

  Scenario: Happy path
    Given a user
    When they sign in
    Then they see the dashboard

  Scenario Outline: Attempt
    Given a user named <name>
    Then access is <outcome>

    Examples:
      | name | outcome |
      | bob  | granted |
      | eve  | denied  |
";

    #[test]
    fn records_and_resolves_plain_scenario() {
        let index = SourceIndex::new();
        index.record_source("features/login.feature", LOGIN_FEATURE);

        let doc = index.document("features/login.feature").unwrap();
        let scenario = doc.resolve_scenario(5, "Happy path").unwrap();
        assert_eq!(scenario.name, "Happy path");
        assert_eq!(scenario.steps.len(), 3);
    }

    #[test]
    fn resolves_outline_by_example_row_line() {
        let index = SourceIndex::new();
        index.record_source("features/login.feature", LOGIN_FEATURE);

        let doc = index.document("features/login.feature").unwrap();
        // Rows of the `Examples:` block at line 14 sit at lines 16 and 17.
        for line in [16, 17] {
            let scenario = doc.resolve_scenario(line, "Attempt").unwrap();
            assert_eq!(scenario.name, "Attempt");
        }
    }

    #[test]
    fn unknown_scenario_is_fatal() {
        let index = SourceIndex::new();
        index.record_source("features/login.feature", LOGIN_FEATURE);

        let doc = index.document("features/login.feature").unwrap();
        let err = doc.resolve_scenario(99, "Happy path").unwrap_err();
        assert!(matches!(err, Error::ScenarioNotFound { line: 99, .. }));
    }

    #[test]
    fn re_recording_replaces_the_document() {
        let index = SourceIndex::new();
        index.record_source("a.feature", LOGIN_FEATURE);
        index.record_source(
            "a.feature",
            "Feature: Other\n  Scenario: Only\n    Given nothing\n",
        );

        let doc = index.document("a.feature").unwrap();
        assert_eq!(doc.feature().unwrap().name, "Other");
        assert!(doc.resolve_scenario(5, "Happy path").is_err());
        assert!(doc.resolve_scenario(2, "Only").is_ok());
    }

    #[test]
    fn parse_failure_is_preserved_and_surfaced() {
        let index = SourceIndex::new();
        index.record_source("broken.feature", "not gherkin at all");

        let doc = index.document("broken.feature").unwrap();
        let err = doc.resolve_scenario(1, "anything").unwrap_err();
        assert!(matches!(err, Error::UnparsableSource { .. }));
    }

    #[test]
    fn unknown_uri_is_fatal() {
        let index = SourceIndex::new();
        assert!(matches!(
            index.document("nowhere.feature").unwrap_err(),
            Error::UnknownSource { .. },
        ));
    }

    #[test]
    fn example_row_lines_span_all_blocks() {
        let src = "\
Feature: F
  Scenario Outline: O
    Given <a>

    Examples:
      | a |
      | 1 |
      | 2 |

    Examples:
      | a |
      | 3 |
";
        let feature =
            gherkin::Feature::parse(src, GherkinEnv::default()).unwrap();
        let lines: Vec<_> =
            example_row_lines(&feature.scenarios[0]).collect();
        assert_eq!(lines, vec![7, 8, 12]);
    }
}
