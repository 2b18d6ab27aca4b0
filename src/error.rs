// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of relaying runner events to the reporting service.
//!
//! Every variant here is a protocol violation: the runner's event stream
//! diverged from the state this crate reconstructed out of it, and reporting
//! cannot safely continue. Recoverable conditions (an unparsable source
//! file, an unmapped status, a missing step-definition capability) are not
//! errors — they degrade to fallback values with a [`tracing`] warning.

use derive_more::{Display, Error};

/// Fatal error of the reporting relay.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
pub enum Error {
    /// A runtime test case referenced a source URI no `SourceRead` event has
    /// been recorded for.
    #[display("no source has been recorded for `{uri}`")]
    UnknownSource {
        /// URI of the missing source.
        uri: String,
    },

    /// A runtime test case resolved to a source document that failed to
    /// parse when it was recorded.
    ///
    /// Carries the preserved parser diagnostics, so the resolution failure
    /// names its actual cause instead of a generic "scenario not found".
    #[display("feature file `{uri}` is unparsable: {message}")]
    UnparsableSource {
        /// URI of the unparsable source.
        uri: String,

        /// Parser diagnostics captured when the source was recorded.
        message: String,
    },

    /// No scenario definition in the parsed document matches a runtime test
    /// case, neither by its own line and name nor by an example-row line.
    #[display("scenario `{name}` at {uri}:{line} is not present in the \
              parsed feature")]
    ScenarioNotFound {
        /// URI of the owning source document.
        uri: String,

        /// Name of the unmatched runtime test case.
        name: String,

        /// Line of the unmatched runtime test case.
        line: usize,
    },

    /// A runtime step's line maps to no step of the scenario or its
    /// background.
    #[display("no step at line {line} of scenario `{scenario}`")]
    StepNotFound {
        /// Name of the scenario the step was looked up in.
        scenario: String,

        /// Unmapped source line.
        line: usize,
    },

    /// Internal-consistency guard: a scenario started under a feature
    /// context resolved for a different URI.
    #[display("scenario URI `{scenario_uri}` does not match feature URI \
              `{feature_uri}`")]
    UriMismatch {
        /// URI of the runtime test case.
        scenario_uri: String,

        /// URI of the resolved feature context.
        feature_uri: String,
    },

    /// Attempt to re-assign a remote item identifier that has already been
    /// set on a context.
    #[display("attempting to re-assign the reported item of scenario \
              `{scenario}`")]
    ItemAlreadyAssigned {
        /// Name of the scenario whose item was re-assigned.
        scenario: String,
    },

    /// A step or hook event arrived on a worker thread with no scenario
    /// pinned to it.
    #[display("no scenario is running on the current worker")]
    NoRunningScenario,

    /// A scenario-level event arrived before the `RunStarted` event opened
    /// the launch.
    #[display("launch has not been started")]
    LaunchNotStarted,
}

/// Result of a reporting-relay operation.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparsable_source_names_the_cause() {
        let err = Error::UnparsableSource {
            uri: "features/login.feature".into(),
            message: "unexpected token at line 3".into(),
        };

        let msg = err.to_string();
        assert!(msg.contains("features/login.feature"));
        assert!(msg.contains("unexpected token at line 3"));
    }

    #[test]
    fn uri_mismatch_message_matches_guard_wording() {
        let err = Error::UriMismatch {
            scenario_uri: "a.feature".into(),
            feature_uri: "b.feature".into(),
        };
        assert_eq!(
            err.to_string(),
            "scenario URI `a.feature` does not match feature URI \
             `b.feature`",
        );
    }
}
