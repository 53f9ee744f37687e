pub mod history;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use history::{process_history_command, HistoryCommand};
use output::report::render_report;
use tracing::{info, level_filters::LevelFilter};

use crate::{
    export::{dashboard_url, decode_fragment, Summary, DEFAULT_DASHBOARD_URL},
    host::STATS_DIR,
    insights::{insights_or_fallback, OfflineInsights, Reflection},
    storage::stats_storage::{JsonStatsStore, StatsStore},
    utils::{
        clock::{Clock, DefaultClock},
        dir::resolve_application_path,
        logging::{enable_logging, CLI_PREFIX},
        time::{format_hours_minutes, parse_record_name},
    },
};

#[derive(Parser, Debug)]
#[command(name = "sitetime", version, long_about = None)]
#[command(about = "Shows how much time the browser spent on each website", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show the most visited sites of a day")]
    Stats {
        #[arg(long, help = "Day to show as YYYY-MM-DD. Defaults to today")]
        date: Option<String>,
        #[arg(short, long, default_value_t = 8, help = "Number of sites to show")]
        limit: usize,
    },
    #[command(about = "Forget today's totals")]
    Reset {},
    #[command(about = "Print a dashboard link carrying today's totals")]
    Export {
        #[arg(long = "dashboard-url", default_value = DEFAULT_DASHBOARD_URL)]
        dashboard_url: String,
    },
    #[command(about = "Show the totals carried by a dashboard link")]
    Decode {
        #[arg(help = "Dashboard url or just its fragment")]
        fragment: String,
    },
    #[command(about = "Short commentary on today's browsing")]
    Insights {
        #[arg(long, help = "Highlight of the day")]
        highlight: Option<String>,
        #[arg(long, help = "Activity you would trade for sleep")]
        trade: Option<String>,
    },
    #[command(about = "Sum totals over several days")]
    History {
        #[command(flatten)]
        command: HistoryCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let app_dir = resolve_application_path(args.dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    let store = JsonStatsStore::new(app_dir.join(STATS_DIR))?;
    let today = DefaultClock.today();

    match args.commands {
        Commands::Stats { date, limit } => {
            let day = date.as_deref().map(parse_record_name).transpose()?.unwrap_or(today);
            let stats = store.load_day(day).await?.unwrap_or_default();
            print!("{}", render_report(&stats, limit));
            Ok(())
        }
        Commands::Reset {} => {
            store.clear().await?;
            info!("Cleared stored totals");
            println!("Cleared today's totals. A running browser keeps counting from its own copy until it is reset too.");
            Ok(())
        }
        Commands::Export { dashboard_url: base } => {
            let stats = store.load_day(today).await?.unwrap_or_default();
            println!("{}", dashboard_url(&base, &stats)?);
            Ok(())
        }
        Commands::Decode { fragment } => {
            print!("{}", describe_fragment(&fragment));
            Ok(())
        }
        Commands::Insights { highlight, trade } => {
            let stats = store.load_day(today).await?.unwrap_or_default();
            let reflection = (highlight.is_some() || trade.is_some()).then(|| Reflection {
                highlight: highlight.unwrap_or_default(),
                trade: trade.unwrap_or_default(),
            });
            println!(
                "{}",
                insights_or_fallback(&OfflineInsights, &stats, reflection.as_ref()).await
            );
            Ok(())
        }
        Commands::History { command } => process_history_command(command, store).await,
    }
}

/// Summary and report for a dashboard link. Unreadable links describe an empty day.
fn describe_fragment(fragment: &str) -> String {
    let stats = decode_fragment(fragment);
    let summary = Summary::of(&stats);
    format!(
        "{} total, {} sites, longest stretch {} min\n\n{}",
        format_hours_minutes(summary.total_seconds),
        summary.sites,
        summary.longest_stretch_minutes,
        render_report(&stats, usize::MAX)
    )
}
