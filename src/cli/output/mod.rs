pub mod report;

use std::{future, pin::pin};

use anyhow::Result;
use chrono::NaiveDate;
use futures::{stream, Stream, StreamExt};
use tracing::{error, trace};

use crate::{storage::stats_storage::StatsStore, tracker::totals::HostSeconds};

/// Totals merged over several days.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RangeTotals {
    pub per_host: HostSeconds,
    /// Days that had any recorded data.
    pub active_days: usize,
}

/// Loads every day between `start` and `end` (both inclusive). A few days are read at the same
/// time, results still come in date order.
pub fn load_days<'a, S: StatsStore>(
    store: &'a S,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Stream<Item = (NaiveDate, Result<Option<HostSeconds>>)> + 'a {
    date_range(start, end)
        .map(move |day| async move { (day, store.load_day(day).await) })
        .buffered(4)
}

pub async fn sum_days<S: StatsStore>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeTotals> {
    let mut days = pin!(load_days(store, start, end));
    let mut totals = RangeTotals::default();

    while let Some((day, data)) = days.next().await {
        match data {
            Ok(Some(data)) => {
                totals.active_days += 1;
                for (host, seconds) in data {
                    let entry = totals.per_host.entry(host).or_default();
                    *entry = entry.saturating_add(seconds);
                }
            }
            Ok(None) => trace!("Nothing recorded for {day}"),
            Err(e) => {
                error!("Failed to process day {day} {e}");
                return Err(e);
            }
        }
    }

    Ok(totals)
}

/// Returns a stream of dates between start (inclusive) and end (inclusive).
fn date_range(start: NaiveDate, end: NaiveDate) -> impl Stream<Item = NaiveDate> {
    stream::unfold(Some(start), move |current| {
        future::ready(match current {
            Some(current) if current <= end => Some((current, current.succ_opt())),
            _ => None,
        })
    })
}
