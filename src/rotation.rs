//! Rotation trigger compilation (spec §4.6)
//!
//! A rotation trigger is one of five variants (disabled, fixed size,
//! elapsed duration, named frequency, or a fixed daytime), plus an escape
//! hatch for a user callable. Human-readable strings are parsed in order
//! (size, then duration, then frequency, then daytime); the first parser
//! that accepts the whole string wins, grounded in the original
//! implementation's `parse_size`/`parse_duration`/`parse_frequency`/
//! `parse_daytime` static methods.
//!
//! Time-based triggers never call `Utc::now()` directly: every decision
//! takes the record's time as an explicit parameter, so rotation boundaries
//! are testable without sleeping.

use crate::error::{Result, ScrivenerError};
use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc, Weekday};
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;

/// A named rotation frequency, expanding to the next boundary of that unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the first boundary of this frequency strictly after `from`.
    fn next_boundary(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Frequency::Hourly => {
                let truncated = truncate_to(from, from.date_naive().and_hms_opt(from.hour(), 0, 0));
                step_if_not_after(truncated, from, TimeDelta::hours(1))
            }
            Frequency::Daily => {
                let truncated = truncate_to(from, from.date_naive().and_hms_opt(0, 0, 0));
                step_if_not_after(truncated, from, TimeDelta::days(1))
            }
            Frequency::Weekly => {
                let days_from_monday = from.weekday().num_days_from_monday() as i64;
                let monday = from.date_naive() - chrono::Duration::days(days_from_monday);
                let truncated = truncate_to(from, monday.and_hms_opt(0, 0, 0));
                step_if_not_after(truncated, from, TimeDelta::weeks(1))
            }
            Frequency::Monthly => {
                let first = chrono::NaiveDate::from_ymd_opt(from.year(), from.month(), 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0));
                let truncated = truncate_to(from, first);
                if truncated > from {
                    truncated
                } else {
                    let (y, m) = if from.month() == 12 {
                        (from.year() + 1, 1)
                    } else {
                        (from.year(), from.month() + 1)
                    };
                    let next = chrono::NaiveDate::from_ymd_opt(y, m, 1)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .expect("valid calendar month boundary");
                    DateTime::<Utc>::from_naive_utc_and_offset(next, Utc)
                }
            }
            Frequency::Yearly => {
                let first = chrono::NaiveDate::from_ymd_opt(from.year(), 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0));
                let truncated = truncate_to(from, first);
                if truncated > from {
                    truncated
                } else {
                    let next = chrono::NaiveDate::from_ymd_opt(from.year() + 1, 1, 1)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .expect("valid calendar year boundary");
                    DateTime::<Utc>::from_naive_utc_and_offset(next, Utc)
                }
            }
        }
    }
}

fn truncate_to(from: DateTime<Utc>, naive: Option<chrono::NaiveDateTime>) -> DateTime<Utc> {
    let naive = naive.unwrap_or_else(|| from.naive_utc());
    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)
}

fn step_if_not_after(truncated: DateTime<Utc>, from: DateTime<Utc>, step: TimeDelta) -> DateTime<Utc> {
    if truncated > from {
        truncated
    } else {
        truncated + step
    }
}

/// Next occurrence of `weekday`+`time` (or, with no weekday, just `time`
/// every day) strictly after `from`.
fn advance_daytime(from: DateTime<Utc>, weekday: Option<Weekday>, time: NaiveTime) -> DateTime<Utc> {
    match weekday {
        None => {
            let candidate = DateTime::<Utc>::from_naive_utc_and_offset(
                from.date_naive().and_time(time),
                Utc,
            );
            if candidate > from {
                candidate
            } else {
                candidate + TimeDelta::days(1)
            }
        }
        Some(wd) => {
            let days_ahead = (wd.num_days_from_monday() as i64
                - from.weekday().num_days_from_monday() as i64)
                .rem_euclid(7);
            let date = from.date_naive() + chrono::Duration::days(days_ahead);
            let candidate = DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(time), Utc);
            if candidate > from {
                candidate
            } else {
                candidate + TimeDelta::weeks(1)
            }
        }
    }
}

/// Compiled rotation trigger for a file sink.
#[derive(Clone)]
pub enum RotationTrigger {
    /// No rotation; writer is the raw file write.
    None,
    /// Rotate when the current offset plus the pending message would exceed this many bytes.
    Size(u64),
    /// Rotate each `delta` elapsed from the previous limit.
    Duration(TimeDelta),
    /// Rotate at the next boundary of a named frequency.
    Frequency(Frequency),
    /// Rotate at a fixed (optionally weekly) time of day.
    Daytime {
        weekday: Option<Weekday>,
        time: NaiveTime,
    },
    /// User callable: given the previous threshold instant, returns the next one.
    Callable(Arc<dyn Fn(DateTime<Utc>) -> DateTime<Utc> + Send + Sync>),
}

impl std::fmt::Debug for RotationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationTrigger::None => write!(f, "RotationTrigger::None"),
            RotationTrigger::Size(n) => write!(f, "RotationTrigger::Size({n})"),
            RotationTrigger::Duration(d) => write!(f, "RotationTrigger::Duration({d:?})"),
            RotationTrigger::Frequency(freq) => write!(f, "RotationTrigger::Frequency({freq:?})"),
            RotationTrigger::Daytime { weekday, time } => {
                write!(f, "RotationTrigger::Daytime({weekday:?}, {time})")
            }
            RotationTrigger::Callable(_) => write!(f, "RotationTrigger::Callable(<fn>)"),
        }
    }
}

impl RotationTrigger {
    pub fn is_size_based(&self) -> bool {
        matches!(self, RotationTrigger::Size(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RotationTrigger::None)
    }

    /// Computes the first time-based rotation threshold from the sink's
    /// start time. Returns `None` for `None`/`Size` triggers.
    pub fn initial_time_limit(&self, start_time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RotationTrigger::None | RotationTrigger::Size(_) => None,
            RotationTrigger::Duration(delta) => Some(start_time + *delta),
            RotationTrigger::Frequency(freq) => Some(freq.next_boundary(start_time)),
            RotationTrigger::Daytime { weekday, time } => {
                Some(advance_daytime(start_time, *weekday, *time))
            }
            RotationTrigger::Callable(f) => Some(f(start_time)),
        }
    }

    /// Advances a prior time limit forward until it strictly exceeds
    /// `record_time`, per spec §4.6's `should_rotate` boundary description.
    /// A `Callable` trigger is invoked exactly once with the record's time,
    /// matching its own contract rather than this stepping loop.
    pub fn next_time_limit(&self, previous: DateTime<Utc>, record_time: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RotationTrigger::Callable(f) => f(record_time),
            RotationTrigger::Duration(delta) => {
                let mut limit = previous;
                while limit <= record_time {
                    limit += *delta;
                }
                limit
            }
            RotationTrigger::Frequency(freq) => {
                let mut limit = previous;
                while limit <= record_time {
                    limit = freq.next_boundary(limit);
                }
                limit
            }
            RotationTrigger::Daytime { weekday, time } => {
                let mut limit = previous;
                while limit <= record_time {
                    limit = advance_daytime(limit, *weekday, *time);
                }
                limit
            }
            RotationTrigger::None | RotationTrigger::Size(_) => previous,
        }
    }
}

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([0-9]+(?:\.[0-9]+)?)\s*([kmgtpezy])?(i)?([bB])?\s*$").unwrap()
});

/// Parses a size string: `<float><k|m|g|t|p|e|z|y>?<i>?<b|B>` (spec §4.6).
/// `i` selects the binary (1024-based) multiplier; `b` is bits, `B` bytes.
pub fn parse_size(s: &str) -> Result<u64> {
    let caps = SIZE_RE
        .captures(s)
        .ok_or_else(|| ScrivenerError::config(format!("invalid size: {s}")))?;
    let value: f64 = caps[1]
        .parse()
        .map_err(|_| ScrivenerError::config(format!("invalid size: {s}")))?;
    let exponent = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
        None => 0,
        Some("k") => 1,
        Some("m") => 2,
        Some("g") => 3,
        Some("t") => 4,
        Some("p") => 5,
        Some("e") => 6,
        Some("z") => 7,
        Some("y") => 8,
        Some(other) => return Err(ScrivenerError::config(format!("invalid size unit: {other}"))),
    };
    let base: f64 = if caps.get(3).is_some() { 1024.0 } else { 1000.0 };
    let mut bytes = value * base.powi(exponent);
    if caps.get(4).map(|m| m.as_str()) == Some("b") {
        bytes /= 8.0;
    }
    Ok(bytes.round() as u64)
}

static DURATION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)(microseconds?|milliseconds?|months?|minutes?|seconds?|hours?|days?|weeks?|years?|us|ms|mo|m|s|h|d|w|y)").unwrap()
});

fn unit_micros(unit: &str) -> Option<i64> {
    Some(match unit {
        "y" | "year" | "years" => 365 * 24 * 3600 * 1_000_000,
        "mo" | "month" | "months" => 2_628_000 * 1_000_000,
        "w" | "week" | "weeks" => 7 * 24 * 3600 * 1_000_000,
        "d" | "day" | "days" => 24 * 3600 * 1_000_000,
        "h" | "hour" | "hours" => 3600 * 1_000_000,
        "m" | "minute" | "minutes" => 60 * 1_000_000,
        "s" | "second" | "seconds" => 1_000_000,
        "ms" | "millisecond" | "milliseconds" => 1_000,
        "us" | "microsecond" | "microseconds" => 1,
        _ => return None,
    })
}

/// Parses concatenations of `<float> <unit>` (spec §4.6), e.g. `"1h 30m"`.
pub fn parse_duration(s: &str) -> Result<TimeDelta> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let mut total_micros: i64 = 0;
    let mut pos = 0usize;
    for caps in DURATION_TOKEN.captures_iter(&compact) {
        let whole = caps.get(0).unwrap();
        if whole.start() != pos {
            return Err(ScrivenerError::config(format!("invalid duration: {s}")));
        }
        pos = whole.end();
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| ScrivenerError::config(format!("invalid duration: {s}")))?;
        let unit = caps[2].to_lowercase();
        let per_unit = unit_micros(&unit)
            .ok_or_else(|| ScrivenerError::config(format!("invalid duration unit: {unit}")))?;
        total_micros += (value * per_unit as f64).round() as i64;
    }
    if pos == 0 || pos != compact.len() {
        return Err(ScrivenerError::config(format!("invalid duration: {s}")));
    }
    Ok(TimeDelta::microseconds(total_micros))
}

/// Parses one of the five named frequencies.
pub fn parse_frequency(s: &str) -> Result<Frequency> {
    match s.trim().to_lowercase().as_str() {
        "hourly" => Ok(Frequency::Hourly),
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        "yearly" => Ok(Frequency::Yearly),
        _ => Err(ScrivenerError::config(format!("invalid frequency: {s}"))),
    }
}

fn parse_weekday(token: &str) -> Result<Weekday> {
    match token {
        "w0" | "monday" | "mon" => Ok(Weekday::Mon),
        "w1" | "tuesday" | "tue" => Ok(Weekday::Tue),
        "w2" | "wednesday" | "wed" => Ok(Weekday::Wed),
        "w3" | "thursday" | "thu" => Ok(Weekday::Thu),
        "w4" | "friday" | "fri" => Ok(Weekday::Fri),
        "w5" | "saturday" | "sat" => Ok(Weekday::Sat),
        "w6" | "sunday" | "sun" => Ok(Weekday::Sun),
        _ => Err(ScrivenerError::config(format!("invalid weekday: {token}"))),
    }
}

fn parse_clock(token: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(token, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(token, "%H:%M"))
        .map_err(|_| ScrivenerError::config(format!("invalid time of day: {token}")))
}

/// Parses `<day>? at? <time>` (spec §4.6): a bare time means every day at
/// that time; a bare day means every week on that day at 00:00.
pub fn parse_daytime(s: &str) -> Result<(Option<Weekday>, NaiveTime)> {
    let lower = s.trim().to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().filter(|t| *t != "at").collect();
    match tokens.as_slice() {
        [time_str] if time_str.contains(':') => Ok((None, parse_clock(time_str)?)),
        [day_str] => Ok((
            Some(parse_weekday(day_str)?),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        )),
        [day_str, time_str] => Ok((Some(parse_weekday(day_str)?), parse_clock(time_str)?)),
        _ => Err(ScrivenerError::config(format!("invalid daytime spec: {s}"))),
    }
}

/// Parses a rotation string in order: size, duration, frequency, daytime;
/// the first parser to accept the whole string wins.
pub fn parse_rotation_string(s: &str) -> Result<RotationTrigger> {
    if let Ok(bytes) = parse_size(s) {
        return Ok(RotationTrigger::Size(bytes));
    }
    if let Ok(duration) = parse_duration(s) {
        return Ok(RotationTrigger::Duration(duration));
    }
    if let Ok(freq) = parse_frequency(s) {
        return Ok(RotationTrigger::Frequency(freq));
    }
    if let Ok((weekday, time)) = parse_daytime(s) {
        return Ok(RotationTrigger::Daytime { weekday, time });
    }
    Err(ScrivenerError::config(format!(
        "unrecognised rotation spec: {s}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn size_units_agree() {
        assert_eq!(parse_size("1KB").unwrap(), 1000);
        assert_eq!(parse_size("1KiB").unwrap(), 1024);
        assert_eq!(parse_size("8000b").unwrap(), 1000);
    }

    #[test]
    fn duration_units_agree() {
        let a = parse_duration("1h 30m").unwrap();
        let b = parse_duration("90m").unwrap();
        let c = parse_duration("5400s").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn rejects_garbage_duration() {
        assert!(parse_duration("banana").is_err());
        assert!(parse_duration("10xyz").is_err());
    }

    #[test]
    fn hourly_first_rotation_matches_next_hour_boundary() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 17, 42).unwrap();
        let trigger = RotationTrigger::Frequency(Frequency::Hourly);
        let limit = trigger.initial_time_limit(start).unwrap();
        assert_eq!(limit, Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap());
    }

    #[test]
    fn daytime_same_day_if_still_ahead_otherwise_next_week() {
        let monday_1300 = Utc.with_ymd_and_hms(2024, 4, 29, 13, 0, 0).unwrap(); // a Monday
        let target = advance_daytime(
            monday_1300,
            Some(Weekday::Mon),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        );
        assert_eq!(target, Utc.with_ymd_and_hms(2024, 4, 29, 14, 0, 0).unwrap());

        let monday_1500 = Utc.with_ymd_and_hms(2024, 4, 29, 15, 0, 0).unwrap();
        let target = advance_daytime(
            monday_1500,
            Some(Weekday::Mon),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        );
        assert_eq!(target, Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap());
    }

    #[test]
    fn parses_rotation_string_in_priority_order() {
        assert!(matches!(
            parse_rotation_string("100B").unwrap(),
            RotationTrigger::Size(100)
        ));
        assert!(matches!(
            parse_rotation_string("1h").unwrap(),
            RotationTrigger::Duration(_)
        ));
        assert!(matches!(
            parse_rotation_string("daily").unwrap(),
            RotationTrigger::Frequency(Frequency::Daily)
        ));
        assert!(matches!(
            parse_rotation_string("monday at 14:00").unwrap(),
            RotationTrigger::Daytime { .. }
        ));
    }
}
