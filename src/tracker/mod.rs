//! Time accounting for the active browser tab.
//!
//! [SessionTracker] owns at most one [session::Session] and the day's [totals::DailyTotals]. It
//! reacts to tab and window events one at a time, turning the elapsed time of every closed
//! session into seconds for the host the tab shows at close time.

pub mod session;
pub mod tabs;
pub mod totals;

use tracing::{debug, error, info, warn};

use crate::{
    classifier::{classify, is_excluded},
    storage::stats_storage::StatsStore,
    utils::{clock::Clock, time::whole_seconds},
};

use session::Session;
use tabs::{Tab, TabId, TabSource};
use totals::{DailyTotals, HostSeconds};

/// Sessions shorter than this are accidental switches and are never credited.
pub const MIN_SESSION_SECS: u64 = 3;

/// Live sessions are shown in stats once they are at least this long.
pub const MIN_LIVE_SECS: u64 = 1;

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub min_session_secs: u64,
    pub min_live_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_session_secs: MIN_SESSION_SECS,
            min_live_secs: MIN_LIVE_SECS,
        }
    }
}

/// Why a session ended without adding time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discarded {
    TabGone,
    Excluded,
    TooShort(u64),
}

/// Result of closing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    NothingTracked,
    Credited { host: String, seconds: u64 },
    Discarded(Discarded),
}

pub struct SessionTracker<T, S> {
    tabs: T,
    store: S,
    clock: Box<dyn Clock>,
    config: TrackerConfig,
    session: Session,
    totals: DailyTotals,
}

impl<T: TabSource, S: StatsStore> SessionTracker<T, S> {
    pub fn new(tabs: T, store: S, clock: Box<dyn Clock>, config: TrackerConfig) -> Self {
        let today = clock.today();
        Self {
            tabs,
            store,
            clock,
            config,
            session: Session::Idle,
            totals: DailyTotals::empty(today),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn totals(&self) -> &DailyTotals {
        &self.totals
    }

    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    /// Tab state is fed by the same serial event stream that drives the tracker.
    pub fn tabs_mut(&mut self) -> &mut T {
        &mut self.tabs
    }

    /// Loads persisted totals and starts tracking the active tab if it qualifies.
    pub async fn init(&mut self) {
        self.load_totals().await;
        self.start_tracking_active_tab().await;
    }

    async fn load_totals(&mut self) {
        let today = self.clock.today();
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to load stored totals, starting empty {e:?}");
                self.totals = DailyTotals::empty(today);
                return;
            }
        };

        match stored.last_active_date {
            Some(day) if day == today => {
                debug!("Loaded totals for {day}: {:?}", stored.daily_totals);
                self.totals = DailyTotals {
                    day,
                    per_host: stored.daily_totals,
                };
            }
            previous_day => {
                info!("New day detected, resetting totals");
                if let Some(day) = previous_day {
                    self.archive(DailyTotals {
                        day,
                        per_host: stored.daily_totals,
                    })
                    .await;
                }
                self.totals = DailyTotals::empty(today);
                self.persist().await;
            }
        }
    }

    /// Browser startup and focus regain both land here.
    pub async fn start_tracking_active_tab(&mut self) {
        self.stop_tracking().await;

        match self.tabs.query_active_tab().await {
            Some(tab) => self.open_session(tab),
            None => debug!("No active tab to track"),
        }
    }

    /// Tab became active or the active tab finished loading.
    pub async fn switch_to_tab(&mut self, tab_id: TabId) {
        self.stop_tracking().await;

        match self.tabs.get_tab(tab_id).await {
            Some(tab) => self.open_session(tab),
            None => debug!("Tab {tab_id} disappeared before tracking could start"),
        }
    }

    fn open_session(&mut self, tab: Tab) {
        let Some(url) = tab.url.as_deref() else {
            debug!("Tab {} has no url, staying idle", tab.id);
            self.session = Session::Idle;
            return;
        };
        let class = classify(url);
        if class.excluded {
            debug!("Skipping excluded url {url}");
            self.session = Session::Idle;
            return;
        }

        info!("Starting tracking {}", class.hostname);
        self.session = Session::Tracking {
            tab_id: tab.id,
            host: class.hostname,
            started_at: self.clock.time(),
        };
    }

    /// A closed tab can't confirm what it was showing, so its time is dropped.
    pub fn tab_removed(&mut self, tab_id: TabId) {
        if self.session.tab_id() == Some(tab_id) {
            info!("Active tab {tab_id} was closed, dropping session");
            self.session = Session::Idle;
        }
    }

    /// `None` means no browser window has focus.
    pub async fn focus_changed(&mut self, focused: Option<tabs::WindowId>) {
        match focused {
            None => {
                debug!("Browser lost focus");
                self.stop_tracking().await;
            }
            Some(window_id) => {
                debug!("Window {window_id} gained focus");
                self.start_tracking_active_tab().await;
            }
        }
    }

    /// Closes the session and flushes totals before the process goes away.
    pub async fn suspend(&mut self) {
        self.stop_tracking().await;
        self.persist().await;
    }

    /// Ends the current session, crediting its time when the tab still shows a trackable page
    /// and the session was long enough. Always leaves the tracker idle.
    pub async fn stop_tracking(&mut self) -> CloseOutcome {
        let Session::Tracking {
            tab_id, started_at, ..
        } = self.session.take()
        else {
            return CloseOutcome::NothingTracked;
        };

        // The tab may have been closed or navigated while we were tracking it.
        let Some(url) = self.tabs.get_tab(tab_id).await.and_then(|tab| tab.url) else {
            debug!("Tab {tab_id} no longer exists, dropping session");
            return CloseOutcome::Discarded(Discarded::TabGone);
        };
        if is_excluded(&url) {
            debug!("Tab {tab_id} moved to excluded url {url}, dropping session");
            return CloseOutcome::Discarded(Discarded::Excluded);
        }

        let host = classify(&url).hostname;
        let seconds = whole_seconds(self.clock.time() - started_at);
        if seconds < self.config.min_session_secs {
            debug!("Short session ({seconds}s) on {host}, not recording");
            return CloseOutcome::Discarded(Discarded::TooShort(seconds));
        }

        self.roll_over_day().await;
        let total = self.totals.credit(&host, seconds);
        info!("Recorded {seconds}s on {host} (total: {total}s)");
        self.persist().await;

        CloseOutcome::Credited { host, seconds }
    }

    /// Totals so far including the live session. Doesn't end the session, unless its tab turns
    /// out to be gone, in which case the session is dropped without credit.
    pub async fn current_stats(&mut self) -> HostSeconds {
        let mut stats = if self.totals.day == self.clock.today() {
            self.totals.per_host.clone()
        } else {
            HostSeconds::new()
        };

        let Session::Tracking {
            tab_id, started_at, ..
        } = self.session.clone()
        else {
            return stats;
        };

        let Some(tab) = self.tabs.get_tab(tab_id).await else {
            debug!("Tab {tab_id} vanished, resetting tracking state");
            self.session = Session::Idle;
            return stats;
        };

        if let Some(url) = tab.url.as_deref().filter(|url| !is_excluded(url)) {
            let host = classify(url).hostname;
            let seconds = whole_seconds(self.clock.time() - started_at);
            if seconds >= self.config.min_live_secs {
                debug!("Including current session: {seconds}s on {host}");
                *stats.entry(host).or_insert(0) += seconds;
            }
        }

        stats
    }

    /// Forgets today's totals and the live session.
    pub async fn reset_stats(&mut self) {
        info!("Resetting stats");
        self.session = Session::Idle;
        self.totals = DailyTotals::empty(self.clock.today());
        self.persist().await;
    }

    /// Periodic save of the totals as they are, stamped with their own day. Skipped while there
    /// is nothing to keep.
    pub async fn persist_snapshot(&self) {
        if self.totals.is_empty() {
            return;
        }
        debug!("Periodic save: {:?}", self.totals.per_host);
        self.persist().await;
    }

    async fn roll_over_day(&mut self) {
        let today = self.clock.today();
        if let Some(finished) = self.totals.roll_over(today) {
            info!("Day changed from {} to {today}, resetting totals", finished.day);
            self.archive(finished).await;
            self.persist().await;
        }
    }

    async fn archive(&self, finished: DailyTotals) {
        if finished.is_empty() {
            return;
        }
        let day = finished.day;
        if let Err(e) = self.store.archive(finished).await {
            error!("Failed to archive totals for {day} {e:?}");
        }
    }

    /// Storage failures never roll back memory, the next successful write catches up.
    async fn persist(&self) {
        if let Err(e) = self.store.save(self.totals.clone()).await {
            error!("Failed to save totals {e:?}");
        }
    }
}

#[cfg(test)]
mod tests;
