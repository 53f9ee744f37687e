use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::tracker::TrackerConfig;

use super::HostSettings;

#[derive(Parser, Debug)]
#[command(name = "sitetime-host", version)]
#[command(about = "Native messaging host tracking time spent per website", long_about = None)]
pub struct HostArgs {
    #[arg(
        long,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(
        long = "save-interval",
        default_value_t = 30,
        help = "Seconds between periodic saves of today's totals"
    )]
    pub save_interval: u64,
    /// This option is for debugging purposes only. Logs go to stderr, stdout is reserved for
    /// the browser.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    /// Browsers pass the calling extension's origin and sometimes a parent window handle.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub browser_args: Vec<String>,
}

impl From<&HostArgs> for HostSettings {
    fn from(args: &HostArgs) -> Self {
        HostSettings {
            save_interval: Duration::from_secs(args.save_interval.max(1)),
            tracker: TrackerConfig::default(),
        }
    }
}
