use std::collections::HashMap;

use async_trait::async_trait;
use tracing::trace;

use crate::tracker::tabs::{Tab, TabId, TabSource, WindowId, WINDOW_ID_NONE};

/// Mirror of the browser's tabs, kept up to date from the events the extension forwards. Lookups
/// answer from the mirror, so a tab is "gone" as soon as its removal event was applied.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<TabId, Tab>,
    focused_window: Option<WindowId>,
}

impl TabRegistry {
    /// Replaces the whole mirror. Sent once when the extension connects.
    ///
    /// Without an explicit focused window the window of an active tab is assumed, the lowest
    /// window id when several qualify. `WINDOW_ID_NONE` means no window has focus.
    pub fn replace_all(&mut self, tabs: Vec<Tab>, focused_window: Option<WindowId>) {
        self.tabs = tabs.into_iter().map(|tab| (tab.id, tab)).collect();
        self.focused_window = match focused_window {
            Some(id) => Some(id).filter(|id| *id != WINDOW_ID_NONE),
            None => self
                .tabs
                .values()
                .filter(|tab| tab.active)
                .map(|tab| tab.window_id)
                .min(),
        };
        trace!(
            "Registry now holds {} tabs, focused window {:?}",
            self.tabs.len(),
            self.focused_window
        );
    }

    /// A tab became the active one of its window. Unknown tabs are recorded with what is known.
    pub fn activate(&mut self, tab_id: TabId, window_id: WindowId) {
        for tab in self.tabs.values_mut() {
            if tab.window_id == window_id {
                tab.active = tab.id == tab_id;
            }
        }
        let tab = self.tabs.entry(tab_id).or_insert_with(|| Tab {
            id: tab_id,
            window_id,
            url: None,
            active: true,
        });
        tab.window_id = window_id;
        tab.active = true;
    }

    pub fn upsert(&mut self, tab: Tab) {
        if tab.active {
            for other in self.tabs.values_mut() {
                if other.window_id == tab.window_id && other.id != tab.id {
                    other.active = false;
                }
            }
        }
        self.tabs.insert(tab.id, tab);
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<Tab> {
        self.tabs.remove(&tab_id)
    }

    pub fn focus(&mut self, window_id: Option<WindowId>) {
        self.focused_window = window_id.filter(|id| *id != WINDOW_ID_NONE);
    }

}

#[async_trait]
impl TabSource for TabRegistry {
    async fn get_tab(&self, tab_id: TabId) -> Option<Tab> {
        self.tabs.get(&tab_id).cloned()
    }

    async fn query_active_tab(&self) -> Option<Tab> {
        let window_id = self.focused_window?;
        self.tabs
            .values()
            .find(|tab| tab.window_id == window_id && tab.active)
            .cloned()
    }
}
