//! In-memory [`ReportClient`] capturing every produced call.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use crate::sync::lock;

use super::{
    FinishItemRequest, FinishLaunchRequest, ItemId, LaunchId, LogRequest,
    ReportClient, StartItemRequest, StartLaunchRequest,
};

/// One captured [`ReportClient`] call.
#[derive(Clone, Debug)]
pub enum ClientCall {
    /// Captured [`ReportClient::start_launch()`] call.
    StartLaunch(StartLaunchRequest),

    /// Captured [`ReportClient::start_item()`] call.
    StartItem {
        /// Minted handle of the started item.
        id: ItemId,

        /// Parent the item was started under.
        parent: Option<ItemId>,

        /// Request payload.
        request: StartItemRequest,
    },

    /// Captured [`ReportClient::finish_item()`] call.
    FinishItem {
        /// Handle of the finished item.
        id: ItemId,

        /// Request payload.
        request: FinishItemRequest,
    },

    /// Captured [`ReportClient::send_log()`] call.
    Log(LogRequest),

    /// Captured [`ReportClient::finish_launch()`] call.
    FinishLaunch {
        /// Handle of the finished launch.
        id: LaunchId,

        /// Request payload.
        request: FinishLaunchRequest,
    },
}

/// [`ReportClient`] that records every call instead of talking to a remote
/// service.
///
/// Handles are minted from a monotonic counter (`item-0`, `item-1`, …), so
/// assertions can follow parent/child references deterministically.
#[derive(Debug, Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<ClientCall>>,
    counter: AtomicUsize,
}

impl RecordingClient {
    /// Creates an empty [`RecordingClient`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured call, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        lock(&self.calls).clone()
    }

    /// Captured `start_item` calls of the given item type, in call order.
    #[must_use]
    pub fn started_items(
        &self,
        item_type: super::ItemType,
    ) -> Vec<(ItemId, Option<ItemId>, StartItemRequest)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ClientCall::StartItem { id, parent, request }
                    if request.item_type == item_type =>
                {
                    Some((id.clone(), parent.clone(), request.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Captured `finish_item` calls, in call order.
    #[must_use]
    pub fn finished_items(&self) -> Vec<(ItemId, FinishItemRequest)> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ClientCall::FinishItem { id, request } => {
                    Some((id.clone(), request.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Captured log entries, in call order.
    #[must_use]
    pub fn logs(&self) -> Vec<LogRequest> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ClientCall::Log(rq) => Some(rq.clone()),
                _ => None,
            })
            .collect()
    }

    fn mint(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }
}

impl ReportClient for RecordingClient {
    fn start_launch(&self, request: StartLaunchRequest) -> LaunchId {
        let id = LaunchId::new(self.mint("launch"));
        lock(&self.calls).push(ClientCall::StartLaunch(request));
        id
    }

    fn start_item(
        &self,
        parent: Option<&ItemId>,
        request: StartItemRequest,
    ) -> ItemId {
        let id = ItemId::new(self.mint("item"));
        lock(&self.calls).push(ClientCall::StartItem {
            id: id.clone(),
            parent: parent.cloned(),
            request,
        });
        id
    }

    fn finish_item(&self, item: &ItemId, request: FinishItemRequest) {
        lock(&self.calls)
            .push(ClientCall::FinishItem { id: item.clone(), request });
    }

    fn send_log(&self, request: LogRequest) {
        lock(&self.calls).push(ClientCall::Log(request));
    }

    fn finish_launch(&self, launch: &LaunchId, request: FinishLaunchRequest) {
        lock(&self.calls)
            .push(ClientCall::FinishLaunch { id: launch.clone(), request });
    }
}
