//! Messages exchanged with the browser extension. Every message is a JSON object tagged by its
//! `type` field, field names are camelCase.

use serde::{Deserialize, Serialize};

use crate::tracker::{
    tabs::{Tab, TabId, WindowId},
    totals::HostSeconds,
};

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    #[serde(other)]
    Unknown,
}

/// Browser events and UI requests, in the order the extension observed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    /// Extension installed or browser started. Carries every open tab.
    Started {
        tabs: Vec<Tab>,
        #[serde(default)]
        focused_window_id: Option<WindowId>,
    },
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabUpdated {
        tab_id: TabId,
        #[serde(default)]
        status: Option<TabStatus>,
        tab: Tab,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// `windowId` is `-1` when no browser window has focus.
    FocusChanged {
        window_id: WindowId,
    },
    Suspend,
    GetStats {
        request_id: RequestId,
    },
    ResetStats {
        request_id: RequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostResponse {
    Stats {
        request_id: RequestId,
        stats: HostSeconds,
    },
    Reset {
        request_id: RequestId,
        success: bool,
    },
}
