use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use now::DateTimeNow;

use crate::storage::stats_storage::StatsStore;

use super::{
    output::{report::render_report, sum_days},
    Args,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Days shown when no start is given, today included.
const DEFAULT_DAYS: i64 = 7;

#[derive(Debug, Parser)]
pub struct HistoryCommand {
    #[arg(
        long = "start",
        short,
        help = "First day of the range. Examples are \"yesterday\", \"3 days ago\", \"15/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "Last day of the range. Examples are \"yesterday\", \"3 days ago\", \"15/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        short,
        long,
        help = "Start from the beginning of the current week",
        conflicts_with = "start_date"
    )]
    week: bool,
    #[arg(short, long, default_value_t = 10, help = "Number of sites to show")]
    limit: usize,
}

/// Sums the per-site totals kept for every day of the range and prints them like `stats` does.
pub async fn process_history_command(
    command: HistoryCommand,
    store: impl StatsStore,
) -> Result<()> {
    let limit = command.limit;
    let (start, end) = parse_range(command, Local::now())?;

    let totals = sum_days(&store, start, end).await?;

    println!(
        "{start} - {end}, {} day(s) with activity\n",
        totals.active_days
    );
    print!("{}", render_report(&totals.per_host, limit));
    Ok(())
}

/// Also provides sensible defaults for `history` command.
fn parse_range(
    HistoryCommand {
        start_date,
        end_date,
        date_style,
        week,
        ..
    }: HistoryCommand,
    now: DateTime<Local>,
) -> Result<(NaiveDate, NaiveDate)> {
    let dialect: chrono_english::Dialect = date_style.into();
    let start = match start_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => v.date_naive(),
        Some(Err(e)) => return Err(validation_error(format!("Failed to validate start date {e}"))),
        None if week => now.beginning_of_week().date_naive(),
        None => (now - Duration::days(DEFAULT_DAYS - 1)).date_naive(),
    };
    let end = match end_date.map(|s| parse_date_string(&s, now, dialect)) {
        Some(Ok(v)) => v.date_naive(),
        Some(Err(e)) => return Err(validation_error(format!("Failed to validate end date {e}"))),
        None => now.date_naive(),
    };

    if start > end {
        return Err(validation_error(format!(
            "Start {start} is after end {end}"
        )));
    }
    Ok((start, end))
}

fn validation_error(message: String) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}
