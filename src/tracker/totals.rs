use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Seconds per host, the map every layer passes around.
pub type HostSeconds = BTreeMap<String, u64>;

/// Accumulated seconds per host for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTotals {
    pub day: NaiveDate,
    pub per_host: HostSeconds,
}

impl DailyTotals {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            per_host: HostSeconds::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.per_host.is_empty()
    }

    /// Adds `seconds` to `host` and returns the new total for it.
    pub fn credit(&mut self, host: &str, seconds: u64) -> u64 {
        let total = self.per_host.entry(host.to_string()).or_insert(0);
        *total = total.saturating_add(seconds);
        *total
    }

    /// Moves the totals to `today` if the day changed. Returns the finished day when a rollover
    /// happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> Option<DailyTotals> {
        if self.day == today {
            return None;
        }
        Some(std::mem::replace(self, DailyTotals::empty(today)))
    }
}
