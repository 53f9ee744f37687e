//!  Storage is organized through [stats_storage::JsonStatsStore].
//!  The basic idea is:
//!   - There is a directory with a single live file, `stats.json`, holding today's totals and
//!     the day they belong to.
//!   - Finished days are moved into `history/YYYY-MM-DD.json` when the day rolls over.
//!   - Every write replaces a whole file. Writers never merge, the last write wins.

pub mod entities;
pub mod stats_storage;
