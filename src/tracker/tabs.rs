use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

/// Browser sentinel for "no window has focus".
pub const WINDOW_ID_NONE: WindowId = -1;

/// What the tracker needs to know about a browser tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    /// Missing for tabs the browser doesn't expose a URL for yet.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// Lookup side of the browser. Answers reflect the browser at the moment of the call; a tab
/// returned by one call may be gone by the next.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TabSource: Send + Sync {
    async fn get_tab(&self, tab_id: TabId) -> Option<Tab>;

    /// Active tab of the current window.
    async fn query_active_tab(&self) -> Option<Tab>;
}
