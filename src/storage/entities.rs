use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tracker::totals::{DailyTotals, HostSeconds};

/// Contents of the live stats file. Both keys are optional on disk: a missing `dailyTotals`
/// reads as an empty map and a missing `lastActiveDate` as "never active".
#[derive(PartialEq, Eq, Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StoredStatsEntity {
    #[serde(default)]
    pub daily_totals: HostSeconds,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
}

impl From<DailyTotals> for StoredStatsEntity {
    fn from(DailyTotals { day, per_host }: DailyTotals) -> Self {
        StoredStatsEntity {
            daily_totals: per_host,
            last_active_date: Some(day),
        }
    }
}

/// A finished day kept under `history/`.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDayEntity {
    pub day: NaiveDate,
    #[serde(default)]
    pub daily_totals: HostSeconds,
}

impl From<DailyTotals> for HistoryDayEntity {
    fn from(DailyTotals { day, per_host }: DailyTotals) -> Self {
        HistoryDayEntity {
            day,
            daily_totals: per_host,
        }
    }
}
