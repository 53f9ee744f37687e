use crate::{tracker::totals::HostSeconds, utils::time::format_duration};

pub const NO_ACTIVITY: &str = "No activity detected today";

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUsage<'a> {
    pub host: &'a str,
    pub seconds: u64,
}

/// Sites with any time, most used first. Ties keep alphabetical order.
pub fn rank_sites(stats: &HostSeconds, limit: usize) -> Vec<SiteUsage<'_>> {
    let mut sites: Vec<_> = stats
        .iter()
        .filter(|(_, seconds)| **seconds > 0)
        .map(|(host, seconds)| SiteUsage {
            host,
            seconds: *seconds,
        })
        .collect();
    sites.sort_by(|a, b| b.seconds.cmp(&a.seconds));
    sites.truncate(limit);
    sites
}

/// Bar length relative to the most used site.
fn bar(seconds: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = ((seconds as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(filled.max(1))
}

/// Renders the list the extension popup shows, one site per line with a total at the end.
pub fn render_report(stats: &HostSeconds, limit: usize) -> String {
    let sites = rank_sites(stats, limit);
    if sites.is_empty() {
        return format!("{NO_ACTIVITY}\n");
    }

    let max = sites[0].seconds;
    let width = sites.iter().map(|s| s.host.len()).max().unwrap_or(0);
    let mut out = String::new();
    for site in &sites {
        out.push_str(&format!(
            "{:<width$}  {:>7}  {}\n",
            site.host,
            format_duration(site.seconds),
            bar(site.seconds, max)
        ));
    }

    let total: u64 = stats.values().sum();
    out.push_str(&format!("\nTotal: {}\n", format_duration(total)));
    out
}
