//! One way hand-off of totals to the dashboard: the map is serialized to JSON, base64 encoded
//! and carried in the URL fragment.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::warn;

use crate::tracker::totals::HostSeconds;

pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:8080/";

pub fn encode_snapshot(stats: &HostSeconds) -> Result<String> {
    let json = serde_json::to_string(stats)?;
    Ok(STANDARD.encode(json))
}

/// Dashboard link for `stats`. Empty totals open the dashboard without a fragment.
pub fn dashboard_url(base: &str, stats: &HostSeconds) -> Result<String> {
    if stats.is_empty() {
        return Ok(base.to_string());
    }
    Ok(format!("{base}#{}", encode_snapshot(stats)?))
}

/// Accepts either a bare fragment or a whole dashboard URL.
fn try_decode_fragment(input: &str) -> Result<HostSeconds> {
    let raw = input
        .rsplit_once('#')
        .map(|(_, fragment)| fragment)
        .unwrap_or(input)
        .trim();
    if raw.is_empty() {
        return Ok(HostSeconds::new());
    }
    let json = STANDARD.decode(raw).context("Fragment is not valid base64")?;
    serde_json::from_slice(&json).context("Fragment doesn't hold a hostname to seconds map")
}

/// Same as [try_decode_fragment], but anything unreadable is treated as no data.
pub fn decode_fragment(input: &str) -> HostSeconds {
    try_decode_fragment(input).unwrap_or_else(|e| {
        warn!("Failed to decode dashboard data {e:?}");
        HostSeconds::new()
    })
}

/// Headline numbers the dashboard shows above its charts.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_seconds: u64,
    pub sites: usize,
    /// Longest time spent on a single host, in minutes with one decimal.
    pub longest_stretch_minutes: f64,
}

impl Summary {
    pub fn of(stats: &HostSeconds) -> Self {
        let longest = stats.values().copied().max().unwrap_or(0);
        Summary {
            total_seconds: stats.values().sum(),
            sites: stats.len(),
            longest_stretch_minutes: (longest as f64 / 60. * 10.).round() / 10.,
        }
    }
}
