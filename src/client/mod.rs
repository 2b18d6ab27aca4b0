// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Seam towards the remote reporting service.
//!
//! [`ReportClient`] is the only way this crate talks to the outside world.
//! Every method is fire-and-forget: an implementation mints an opaque
//! identifier handle immediately and performs the actual RPC in the
//! background, so a freshly returned [`ItemId`] is already usable as the
//! parent reference of a child item before the underlying request has
//! completed. Transport, retries and batching are entirely the
//! implementation's concern; the relay never inspects delivery failures.

mod recording;
mod requests;

use std::sync::Arc;

use derive_more::Display;

pub use self::{
    recording::{ClientCall, RecordingClient},
    requests::{
        Attachment, Attribute, FinishItemRequest, FinishLaunchRequest,
        ItemStatus, ItemType, LaunchMode, LogLevel, LogRequest, Parameter,
        StartItemRequest, StartLaunchRequest,
    },
};

/// Opaque handle of a remotely-created launch.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
pub struct LaunchId(Arc<str>);

impl LaunchId {
    /// Creates a [`LaunchId`] out of a client-minted token.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// String form of this handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque handle of a remotely-created report-tree item.
///
/// Minted synchronously by the [`ReportClient`]; the remote service may
/// still be assigning the real identifier while this handle is already
/// passed around as a parent reference.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
pub struct ItemId(Arc<str>);

impl ItemId {
    /// Creates an [`ItemId`] out of a client-minted token.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// String form of this handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Client of a remote hierarchical test-reporting service.
///
/// Implementations must return from every method immediately; the relay's
/// event handlers are called synchronously on the runner's worker threads
/// and must never block on network I/O.
pub trait ReportClient: Send + Sync {
    /// Starts the launch, the root container of the whole report tree.
    fn start_launch(&self, request: StartLaunchRequest) -> LaunchId;

    /// Starts an item under the given `parent`, or directly under the
    /// launch when `parent` is [`None`].
    fn start_item(
        &self,
        parent: Option<&ItemId>,
        request: StartItemRequest,
    ) -> ItemId;

    /// Finishes a previously started item.
    fn finish_item(&self, item: &ItemId, request: FinishItemRequest);

    /// Sends a log entry, optionally carrying an attachment.
    fn send_log(&self, request: LogRequest);

    /// Finishes the launch.
    fn finish_launch(&self, launch: &LaunchId, request: FinishLaunchRequest);
}

impl<T: ReportClient + ?Sized> ReportClient for std::sync::Arc<T> {
    fn start_launch(&self, request: StartLaunchRequest) -> LaunchId {
        (**self).start_launch(request)
    }

    fn start_item(
        &self,
        parent: Option<&ItemId>,
        request: StartItemRequest,
    ) -> ItemId {
        (**self).start_item(parent, request)
    }

    fn finish_item(&self, item: &ItemId, request: FinishItemRequest) {
        (**self).finish_item(item, request);
    }

    fn send_log(&self, request: LogRequest) {
        (**self).send_log(request);
    }

    fn finish_launch(&self, launch: &LaunchId, request: FinishLaunchRequest) {
        (**self).finish_launch(launch, request);
    }
}

impl<T: ReportClient + ?Sized> ReportClient for Box<T> {
    fn start_launch(&self, request: StartLaunchRequest) -> LaunchId {
        (**self).start_launch(request)
    }

    fn start_item(
        &self,
        parent: Option<&ItemId>,
        request: StartItemRequest,
    ) -> ItemId {
        (**self).start_item(parent, request)
    }

    fn finish_item(&self, item: &ItemId, request: FinishItemRequest) {
        (**self).finish_item(item, request);
    }

    fn send_log(&self, request: LogRequest) {
        (**self).send_log(request);
    }

    fn finish_launch(&self, launch: &LaunchId, request: FinishLaunchRequest) {
        (**self).finish_launch(launch, request);
    }
}
