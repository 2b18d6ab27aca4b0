// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Remote test-reporting relay for [Cucumber]-style BDD runners.
//!
//! This crate is a protocol bridge: it subscribes to the flat, per-worker
//! ordered stream of lifecycle [`event`]s a BDD runner emits (run, source
//! read, test case, test step, hook, attachment, free-text write) and drives
//! the hierarchical item tree of a remote reporting service through the
//! [`client::ReportClient`] seam (launch → feature → scenario → step/hook).
//!
//! The interesting parts live in two cooperating state machines:
//!
//! - [`context`] reconstructs the Feature → Scenario → Step/Hook tree out of
//!   the runner's flat event stream, resolving every runtime handle against
//!   the [`source`] index of parsed `.feature` documents;
//! - [`reporter`] maps each reconstructed node onto a remotely-assigned item
//!   identifier and its finish lifecycle, tolerating the runner's lack of an
//!   explicit "feature ended" event and its scenario-per-worker parallelism.
//!
//! This crate does not execute tests and does not talk to the network: the
//! runner and the reporting transport are collaborators reached only through
//! the types in [`event`] and [`client`].
//!
//! [Cucumber]: https://cucumber.io

#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

pub mod client;
pub mod context;
pub mod error;
pub mod event;
pub mod reporter;
pub mod source;
mod sync;

pub use gherkin;

#[doc(inline)]
pub use self::{
    client::{ItemId, LaunchId, ReportClient},
    error::{Error, Result},
    event::{Event, RunnerEvent},
    reporter::{LaunchConfig, Reporter, ReportingMode},
    source::SourceIndex,
};
