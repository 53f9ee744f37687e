use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a string in sitetime. It's used both for the
/// `lastActiveDate` key and for history file names.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

pub fn parse_record_name(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .with_context(|| format!("Invalid day {value:?}, expected YYYY-MM-DD"))
}

/// Whole seconds between two moments. Clock steps backwards are treated as no time passing.
pub fn whole_seconds(elapsed: Duration) -> u64 {
    elapsed.num_seconds().max(0) as u64
}

/// Popup style duration: `1h 5m`, `3m 20s` or `45s`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Dashboard style duration, always with hours and minutes: `0 h 42 m`.
pub fn format_hours_minutes(seconds: u64) -> String {
    format!("{} h {} m", seconds / 3600, (seconds % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    #[test]
    fn test_record_name_round_trip() {
        let date = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();
        assert_eq!(date_to_record_name(date), "2018-07-04");
        assert_eq!(parse_record_name("2018-07-04").unwrap(), date);
        assert!(parse_record_name("Wed Jul 04 2018").is_err());
    }

    #[test]
    fn test_whole_seconds_floors_and_clamps() {
        assert_eq!(whole_seconds(Duration::milliseconds(2999)), 2);
        assert_eq!(whole_seconds(Duration::seconds(10)), 10);
        assert_eq!(whole_seconds(Duration::seconds(-5)), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(200), "3m 20s");
        assert_eq!(format_duration(3900), "1h 5m");
        assert_eq!(format_hours_minutes(2520), "0 h 42 m");
        assert_eq!(format_hours_minutes(7260), "2 h 1 m");
    }
}
