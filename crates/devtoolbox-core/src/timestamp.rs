//! Unix timestamp ⇄ human date conversion.
//!
//! "Now" is always passed in so relative descriptions are testable.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimestampError;

/// Values with at least this magnitude are read as milliseconds when the
/// unit is not given (1e11 seconds is past the year 5000).
const MILLIS_THRESHOLD: u64 = 100_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            other => Err(format!("unit must be seconds or milliseconds (got '{}')", other)),
        }
    }
}

/// Every representation the converter shows for one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampView {
    pub unix_seconds: i64,
    pub unix_millis: i64,
    pub iso8601: String,
    pub rfc2822: String,
    pub utc_human: String,
    pub relative: String,
}

/// Interpret `value` as a Unix timestamp. Without a unit, large magnitudes
/// are taken as milliseconds.
pub fn from_unix(
    value: i64,
    unit: Option<TimeUnit>,
    now: DateTime<Utc>,
) -> Result<TimestampView, TimestampError> {
    let unit = unit.unwrap_or(if value.unsigned_abs() >= MILLIS_THRESHOLD {
        TimeUnit::Milliseconds
    } else {
        TimeUnit::Seconds
    });
    let instant = match unit {
        TimeUnit::Seconds => DateTime::from_timestamp(value, 0),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value),
    }
    .ok_or(TimestampError::OutOfRange(value))?;

    Ok(view(instant, now))
}

/// Parse RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS` (UTC), or `YYYY-MM-DD`.
pub fn parse_date(input: &str, now: DateTime<Utc>) -> Result<TimestampView, TimestampError> {
    let text = input.trim();
    let instant = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
        .ok_or_else(|| TimestampError::Unparseable(text.to_string()))?;

    Ok(view(instant, now))
}

fn view(instant: DateTime<Utc>, now: DateTime<Utc>) -> TimestampView {
    TimestampView {
        unix_seconds: instant.timestamp(),
        unix_millis: instant.timestamp_millis(),
        iso8601: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        rfc2822: instant.to_rfc2822(),
        utc_human: instant.format("%A, %B %-d, %Y %H:%M:%S UTC").to_string(),
        relative: relative(instant, now),
    }
}

/// "3 hours ago", "in 2 days", "just now".
pub fn relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = instant.signed_duration_since(now).num_seconds();
    let magnitude = delta.unsigned_abs();
    if magnitude < 45 {
        return "just now".to_string();
    }

    let (amount, unit) = match magnitude {
        s if s < 3_600 => ((s + 30) / 60, "minute"),
        s if s < 86_400 => ((s + 1_800) / 3_600, "hour"),
        s if s < 2_592_000 => ((s + 43_200) / 86_400, "day"),
        s if s < 31_536_000 => ((s + 1_296_000) / 2_592_000, "month"),
        s => ((s + 15_768_000) / 31_536_000, "year"),
    };
    let amount = amount.max(1);
    let plural = if amount == 1 { "" } else { "s" };

    if delta < 0 {
        format!("{} {}{} ago", amount, unit, plural)
    } else {
        format!("in {} {}{}", amount, unit, plural)
    }
}
