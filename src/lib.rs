//! Keeps track of how long the active browser tab spends on each website, one day at a time.
//! The browser extension forwards tab events to the `sitetime-host` native messaging host, which
//! keeps the totals on disk. The `sitetime` cli reads them back.
//!

pub mod classifier;
pub mod cli;
pub mod export;
pub mod host;
pub mod insights;
pub mod storage;
pub mod tracker;
pub mod utils;
