use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use mockall::predicate::eq;

use crate::{
    storage::{
        entities::StoredStatsEntity,
        stats_storage::{MockStatsStore, StatsStore},
    },
    utils::{
        clock::{test_clock::ManualClock, Clock},
        logging::TEST_LOGGING,
    },
};

use super::{
    session::Session,
    tabs::{MockTabSource, Tab, TabId, TabSource},
    totals::{DailyTotals, HostSeconds},
    CloseOutcome, Discarded, SessionTracker, TrackerConfig,
};

#[derive(Default)]
struct FakeTabs {
    tabs: HashMap<TabId, Tab>,
    active: Option<TabId>,
}

impl FakeTabs {
    fn with_active(id: TabId, url: &str) -> Self {
        let mut tabs = FakeTabs::default();
        tabs.open(id, url);
        tabs.activate(id);
        tabs
    }

    fn open(&mut self, id: TabId, url: &str) {
        self.tabs.insert(
            id,
            Tab {
                id,
                window_id: 1,
                url: Some(url.into()),
                active: false,
            },
        );
    }

    fn activate(&mut self, id: TabId) {
        self.active = Some(id);
    }

    fn navigate(&mut self, id: TabId, url: &str) {
        if let Some(tab) = self.tabs.get_mut(&id) {
            tab.url = Some(url.into());
        }
    }

    fn close(&mut self, id: TabId) {
        self.tabs.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

#[async_trait]
impl TabSource for FakeTabs {
    async fn get_tab(&self, tab_id: TabId) -> Option<Tab> {
        self.tabs.get(&tab_id).cloned()
    }

    async fn query_active_tab(&self) -> Option<Tab> {
        self.active.and_then(|id| self.tabs.get(&id).cloned())
    }
}

#[derive(Clone, Default)]
struct MemoryStore {
    stored: Arc<Mutex<StoredStatsEntity>>,
    archived: Arc<Mutex<Vec<DailyTotals>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    fn with(day: NaiveDate, entries: &[(&str, u64)]) -> Self {
        let store = MemoryStore::default();
        *store.stored.lock().unwrap() = StoredStatsEntity {
            daily_totals: entries.iter().map(|(h, s)| (h.to_string(), *s)).collect(),
            last_active_date: Some(day),
        };
        store
    }

    fn stored(&self) -> StoredStatsEntity {
        self.stored.lock().unwrap().clone()
    }

    fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn load(&self) -> Result<StoredStatsEntity> {
        Ok(self.stored())
    }

    async fn save(&self, totals: DailyTotals) -> Result<()> {
        *self.stored.lock().unwrap() = totals.into();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn archive(&self, totals: DailyTotals) -> Result<()> {
        self.archived.lock().unwrap().push(totals);
        Ok(())
    }

    async fn load_day(&self, day: NaiveDate) -> Result<Option<HostSeconds>> {
        let stored = self.stored();
        Ok((stored.last_active_date == Some(day)).then_some(stored.daily_totals))
    }

    async fn clear(&self) -> Result<()> {
        *self.stored.lock().unwrap() = StoredStatsEntity::default();
        Ok(())
    }
}

fn new_tracker<T: TabSource, S: StatsStore>(
    tabs: T,
    store: S,
    clock: &ManualClock,
) -> SessionTracker<T, S> {
    *TEST_LOGGING;
    SessionTracker::new(tabs, store, Box::new(clock.clone()), TrackerConfig::default())
}

fn hosts(entries: &[(&str, u64)]) -> HostSeconds {
    entries.iter().map(|(h, s)| (h.to_string(), *s)).collect()
}

fn assert_session_consistent<T, S>(tracker: &SessionTracker<T, S>)
where
    T: TabSource,
    S: StatsStore,
{
    let session = tracker.session();
    assert_eq!(session.host().is_some(), session.started_at().is_some());
    assert_eq!(session.tab_id().is_some(), session.started_at().is_some());
}

#[tokio::test]
async fn test_init_starts_tracking_active_tab() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://www.github.com/rust-lang/rust"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    assert_eq!(
        tracker.session(),
        &Session::Tracking {
            tab_id: 1,
            host: "github.com".into(),
            started_at: clock.time(),
        }
    );
}

#[tokio::test]
async fn test_init_stays_idle_without_qualifying_tab() {
    let clock = ManualClock::new();

    let mut tracker = new_tracker(FakeTabs::default(), MemoryStore::default(), &clock);
    tracker.init().await;
    assert!(tracker.session().is_idle());

    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "chrome://newtab"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;
    assert!(tracker.session().is_idle());
}

#[tokio::test]
async fn test_switching_to_excluded_tab_credits_previous_and_goes_idle() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(10);
    tracker.tabs_mut().open(2, "about:blank");
    tracker.tabs_mut().activate(2);
    tracker.switch_to_tab(2).await;

    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 10)]));
    assert!(tracker.session().is_idle());

    // docs.google.com for a single second doesn't count.
    clock.advance(2);
    tracker.tabs_mut().open(3, "https://docs.google.com/document/d/1");
    tracker.tabs_mut().activate(3);
    tracker.switch_to_tab(3).await;
    assert_eq!(tracker.session().host(), Some("docs.google.com"));

    clock.advance(1);
    let outcome = tracker.stop_tracking().await;

    assert_eq!(outcome, CloseOutcome::Discarded(Discarded::TooShort(1)));
    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 10)]));
    assert!(tracker.session().is_idle());
}

#[tokio::test]
async fn test_sessions_on_same_host_accumulate() {
    let clock = ManualClock::new();
    let store = MemoryStore::default();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store.clone(),
        &clock,
    );
    tracker.init().await;

    clock.advance(7);
    assert_eq!(
        tracker.stop_tracking().await,
        CloseOutcome::Credited {
            host: "github.com".into(),
            seconds: 7
        }
    );

    tracker.switch_to_tab(1).await;
    clock.advance(5);
    tracker.stop_tracking().await;

    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 12)]));
    assert_eq!(store.stored().daily_totals, hosts(&[("github.com", 12)]));
}

#[tokio::test]
async fn test_short_sessions_are_not_recorded() {
    let clock = ManualClock::new();
    let store = MemoryStore::default();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store.clone(),
        &clock,
    );
    tracker.init().await;
    let saves = store.saves();

    clock.advance_millis(2999);
    assert_eq!(
        tracker.stop_tracking().await,
        CloseOutcome::Discarded(Discarded::TooShort(2))
    );
    assert!(tracker.totals().is_empty());
    assert_eq!(store.saves(), saves);
}

#[tokio::test]
async fn test_exactly_three_seconds_is_recorded() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(3);
    tracker.focus_changed(None).await;

    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 3)]));
}

#[tokio::test]
async fn test_closed_tab_drops_session_without_credit() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(60);
    tracker.tabs_mut().close(1);
    tracker.tab_removed(1);

    assert!(tracker.session().is_idle());
    assert!(tracker.totals().is_empty());
}

#[tokio::test]
async fn test_removing_other_tab_keeps_session() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    tracker.tab_removed(42);

    assert_eq!(tracker.session().tab_id(), Some(1));
}

#[tokio::test]
async fn test_tab_gone_at_close_is_not_credited() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(30);
    // No removal event reached us, the lookup is the first to notice.
    tracker.tabs_mut().close(1);

    assert_eq!(
        tracker.stop_tracking().await,
        CloseOutcome::Discarded(Discarded::TabGone)
    );
    assert!(tracker.totals().is_empty());
    assert!(tracker.session().is_idle());
}

#[tokio::test]
async fn test_time_is_credited_to_host_shown_at_close() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(20);
    tracker.tabs_mut().navigate(1, "https://www.docs.rs/tokio");
    tracker.switch_to_tab(1).await;

    assert_eq!(tracker.totals().per_host, hosts(&[("docs.rs", 20)]));
    assert_eq!(tracker.session().host(), Some("docs.rs"));
}

#[tokio::test]
async fn test_navigating_to_excluded_url_is_never_credited() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(20);
    tracker.tabs_mut().navigate(1, "chrome://settings");
    tracker.switch_to_tab(1).await;

    assert!(tracker.totals().is_empty());
    assert!(!tracker.totals().per_host.contains_key("settings"));
    assert!(tracker.session().is_idle());
}

#[tokio::test]
async fn test_focus_lost_and_regained() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(15);
    tracker.focus_changed(None).await;
    assert!(tracker.session().is_idle());
    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 15)]));

    // Time away from the browser is not counted.
    clock.advance(600);
    tracker.tabs_mut().open(2, "https://news.ycombinator.com");
    tracker.tabs_mut().activate(2);
    tracker.focus_changed(Some(2)).await;
    assert_eq!(tracker.session().host(), Some("news.ycombinator.com"));

    clock.advance(4);
    tracker.suspend().await;
    assert_eq!(
        tracker.totals().per_host,
        hosts(&[("github.com", 15), ("news.ycombinator.com", 4)])
    );
}

#[tokio::test]
async fn test_focus_moving_between_windows_credits_previous_session() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(9);
    tracker.tabs_mut().open(2, "https://docs.rs");
    tracker.tabs_mut().activate(2);
    // Regaining focus always closes and credits the running session before the re-query.
    tracker.focus_changed(Some(7)).await;

    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 9)]));
    assert_eq!(tracker.session().tab_id(), Some(2));
}

#[tokio::test]
async fn test_suspend_flushes_and_goes_idle() {
    let clock = ManualClock::new();
    let store = MemoryStore::default();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store.clone(),
        &clock,
    );
    tracker.init().await;

    clock.advance(42);
    tracker.suspend().await;

    assert!(tracker.session().is_idle());
    assert_eq!(store.stored().daily_totals, hosts(&[("github.com", 42)]));
    assert_eq!(store.stored().last_active_date, Some(clock.today()));
}

#[tokio::test]
async fn test_at_most_one_session_over_event_sequence() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;
    assert_session_consistent(&tracker);

    tracker.tabs_mut().open(2, "https://docs.rs");
    tracker.tabs_mut().open(3, "about:blank");

    for step in 0..12 {
        clock.advance(step % 5);
        match step % 6 {
            0 => tracker.switch_to_tab(2).await,
            1 => tracker.switch_to_tab(3).await,
            2 => tracker.focus_changed(None).await,
            3 => tracker.focus_changed(Some(1)).await,
            4 => tracker.tab_removed(1),
            _ => {
                tracker.current_stats().await;
            }
        }
        assert_session_consistent(&tracker);
    }
}

#[tokio::test]
async fn test_stored_totals_from_today_are_kept() {
    let clock = ManualClock::new();
    let store = MemoryStore::with(clock.today(), &[("github.com", 100)]);
    let mut tracker = new_tracker(FakeTabs::default(), store.clone(), &clock);
    tracker.init().await;

    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 100)]));
    assert!(store.archived.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_totals_from_another_day_are_reset() {
    let clock = ManualClock::new();
    let yesterday = clock.today() - Duration::days(1);
    let store = MemoryStore::with(yesterday, &[("github.com", 100)]);
    let mut tracker = new_tracker(FakeTabs::default(), store.clone(), &clock);
    tracker.init().await;

    assert!(tracker.totals().is_empty());
    assert_eq!(tracker.totals().day, clock.today());

    let stored = store.stored();
    assert!(stored.daily_totals.is_empty());
    assert_eq!(stored.last_active_date, Some(clock.today()));

    let archived = store.archived.lock().unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].day, yesterday);
    assert_eq!(archived[0].per_host, hosts(&[("github.com", 100)]));
}

#[tokio::test]
async fn test_session_across_midnight_credits_new_day() {
    let clock = ManualClock::new();
    let store = MemoryStore::with(clock.today(), &[("docs.rs", 50)]);
    let first_day = clock.today();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store.clone(),
        &clock,
    );
    tracker.init().await;

    // Started at noon, closes ten seconds after midnight.
    clock.advance(12 * 60 * 60 + 10);
    tracker.stop_tracking().await;

    assert_eq!(tracker.totals().day, first_day + Duration::days(1));
    assert_eq!(
        tracker.totals().per_host,
        hosts(&[("github.com", 12 * 60 * 60 + 10)])
    );
    let archived = store.archived.lock().unwrap();
    assert_eq!(archived[0].day, first_day);
    assert_eq!(archived[0].per_host, hosts(&[("docs.rs", 50)]));
}

#[tokio::test]
async fn test_current_stats_is_non_destructive() {
    let clock = ManualClock::new();
    let store = MemoryStore::with(clock.today(), &[("github.com", 100)]);
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store,
        &clock,
    );
    tracker.init().await;

    clock.advance(5);
    let first = tracker.current_stats().await;
    clock.advance(2);
    let second = tracker.current_stats().await;

    assert_eq!(first, hosts(&[("github.com", 105)]));
    assert_eq!(second, hosts(&[("github.com", 107)]));
    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 100)]));
    assert_eq!(tracker.session().tab_id(), Some(1));

    clock.advance(3);
    tracker.stop_tracking().await;
    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 110)]));
}

#[tokio::test]
async fn test_current_stats_hides_sub_second_session() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance_millis(900);
    assert!(tracker.current_stats().await.is_empty());

    clock.advance_millis(200);
    assert_eq!(tracker.current_stats().await, hosts(&[("github.com", 1)]));
}

#[tokio::test]
async fn test_current_stats_drops_session_of_vanished_tab() {
    let clock = ManualClock::new();
    let mut tabs = MockTabSource::new();
    tabs.expect_query_active_tab().times(1).returning(|| {
        Some(Tab {
            id: 1,
            window_id: 1,
            url: Some("https://github.com".into()),
            active: true,
        })
    });
    tabs.expect_get_tab().with(eq(1)).times(1).returning(|_| None);

    let mut tracker = new_tracker(tabs, MemoryStore::default(), &clock);
    tracker.init().await;

    clock.advance(30);
    assert!(tracker.current_stats().await.is_empty());
    assert!(tracker.session().is_idle());

    // Nothing left to look up.
    assert_eq!(tracker.stop_tracking().await, CloseOutcome::NothingTracked);
    assert!(tracker.totals().is_empty());
}

#[tokio::test]
async fn test_current_stats_ignores_tab_moved_to_excluded_url() {
    let clock = ManualClock::new();
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        MemoryStore::default(),
        &clock,
    );
    tracker.init().await;

    clock.advance(30);
    tracker.tabs_mut().navigate(1, "about:blank");

    assert!(tracker.current_stats().await.is_empty());
    assert_eq!(tracker.session().tab_id(), Some(1));
}

#[tokio::test]
async fn test_current_stats_after_midnight_excludes_previous_day() {
    let clock = ManualClock::new();
    let store = MemoryStore::with(clock.today(), &[("docs.rs", 50)]);
    let mut tracker = new_tracker(FakeTabs::default(), store, &clock);
    tracker.init().await;

    clock.advance(13 * 60 * 60);
    assert!(tracker.current_stats().await.is_empty());
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let clock = ManualClock::new();
    let store = MemoryStore::with(clock.today(), &[("github.com", 100)]);
    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store.clone(),
        &clock,
    );
    tracker.init().await;
    clock.advance(20);

    tracker.reset_stats().await;
    assert!(tracker.totals().is_empty());
    assert!(tracker.session().is_idle());
    assert!(tracker.current_stats().await.is_empty());
    assert!(store.stored().daily_totals.is_empty());

    tracker.reset_stats().await;
    assert!(tracker.totals().is_empty());

    // The old session is gone, closing now credits nothing.
    clock.advance(20);
    assert_eq!(tracker.stop_tracking().await, CloseOutcome::NothingTracked);

    tracker.switch_to_tab(1).await;
    clock.advance(4);
    assert_eq!(tracker.current_stats().await, hosts(&[("github.com", 4)]));
}

#[tokio::test]
async fn test_persist_snapshot_skips_empty_totals() {
    let clock = ManualClock::new();
    let store = MemoryStore::default();
    let mut tracker = new_tracker(FakeTabs::default(), store.clone(), &clock);
    tracker.init().await;
    let saves = store.saves();

    tracker.persist_snapshot().await;
    assert_eq!(store.saves(), saves);

    tracker.tabs_mut().open(1, "https://github.com");
    tracker.switch_to_tab(1).await;
    clock.advance(5);
    tracker.stop_tracking().await;
    let saves = store.saves();

    tracker.persist_snapshot().await;
    assert_eq!(store.saves(), saves + 1);
}

#[tokio::test]
async fn test_load_failure_starts_empty() {
    let clock = ManualClock::new();
    let mut store = MockStatsStore::new();
    store
        .expect_load()
        .times(1)
        .returning(|| Err(anyhow!("permission denied")));
    store.expect_save().returning(|_| Ok(()));

    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store,
        &clock,
    );
    tracker.init().await;

    assert!(tracker.totals().is_empty());
    assert_eq!(tracker.session().tab_id(), Some(1));
}

#[tokio::test]
async fn test_write_failure_keeps_memory() {
    let clock = ManualClock::new();
    let mut store = MockStatsStore::new();
    store
        .expect_load()
        .returning(|| Ok(StoredStatsEntity::default()));
    store
        .expect_save()
        .returning(|_| Err(anyhow!("disk full")));

    let mut tracker = new_tracker(
        FakeTabs::with_active(1, "https://github.com"),
        store,
        &clock,
    );
    tracker.init().await;

    clock.advance(10);
    let outcome = tracker.stop_tracking().await;

    assert_eq!(
        outcome,
        CloseOutcome::Credited {
            host: "github.com".into(),
            seconds: 10
        }
    );
    assert_eq!(tracker.totals().per_host, hosts(&[("github.com", 10)]));
    assert!(tracker.session().is_idle());
}
