//! RFC 5545 RRULE parsing and booking policy.
//!
//! The engine only interprets FREQ, COUNT, UNTIL and BYDAY. Every other part
//! is carried verbatim into the pattern handed to the `rrule` crate, and the
//! original text is kept so it can be echoed back unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::dst::{self, DstPolicy};
use crate::error::{EngineError, Result};

/// Recurrence frequencies supported by the booking domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(EngineError::InvalidRule(format!(
                "unsupported FREQ={other} (expected DAILY, WEEKLY, MONTHLY or YEARLY)"
            ))),
        }
    }
}

/// The UNTIL part of a rule, in whichever of the three RFC 5545 forms it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Until {
    /// `YYYYMMDDTHHMMSSZ`: an absolute instant.
    Utc(DateTime<Utc>),
    /// `YYYYMMDDTHHMMSS`: a wall-clock time in the series' own zone.
    Floating(NaiveDateTime),
    /// `YYYYMMDD`: the whole local day is included.
    Date(NaiveDate),
}

impl Until {
    fn parse(value: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidRule(format!("invalid UNTIL value '{value}'"));

        if let Some(stripped) = value.strip_suffix('Z') {
            let naive =
                NaiveDateTime::parse_from_str(stripped, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
            return Ok(Until::Utc(naive.and_utc()));
        }
        if value.contains('T') {
            let naive =
                NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").map_err(|_| invalid())?;
            return Ok(Until::Floating(naive));
        }
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .map(Until::Date)
            .map_err(|_| invalid())
    }

    /// Latest instant (inclusive) an occurrence may start at, for a series anchored in `tz`.
    pub fn bound(&self, tz: Tz) -> DateTime<Utc> {
        match *self {
            Until::Utc(instant) => instant,
            Until::Floating(naive) => dst::resolve_local(tz, naive, DstPolicy::WallClock)
                .unwrap_or_else(|| tz.from_utc_datetime(&naive))
                .with_timezone(&Utc),
            Until::Date(date) => {
                let (_, next_midnight) = dst::local_day_bounds(tz, date);
                next_midnight - Duration::nanoseconds(1)
            }
        }
    }
}

/// A parsed recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    raw: String,
    frequency: Frequency,
    count: Option<u32>,
    until: Option<Until>,
    by_day: Vec<Weekday>,
    pattern: String,
}

impl RecurrenceRule {
    /// Parse a rule, treating an empty or blank string as "no recurrence".
    pub fn parse_optional(s: &str) -> Result<Option<Self>> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }

    /// The rule text exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn until(&self) -> Option<Until> {
        self.until
    }

    /// Weekdays named in BYDAY, in the order written (ordinal prefixes dropped).
    pub fn weekdays(&self) -> &[Weekday] {
        &self.by_day
    }

    /// True when COUNT or UNTIL terminates the series.
    pub fn is_finite(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// The rule without COUNT and UNTIL, which the expander applies itself.
    pub(crate) fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Booking rules must name exactly one of COUNT or UNTIL.
    pub fn validate_for_booking(&self) -> Result<()> {
        match (self.count, self.until) {
            (Some(_), Some(_)) => Err(EngineError::InvalidRule(format!(
                "'{}' sets both COUNT and UNTIL; a booking rule must set exactly one",
                self.raw
            ))),
            (None, None) => Err(EngineError::InvalidRule(format!(
                "'{}' sets neither COUNT nor UNTIL; a booking rule must be finite",
                self.raw
            ))),
            _ => Ok(()),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.to_string();
        let body = s.trim();
        let body = match body.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("RRULE:") => &body[6..],
            _ => body,
        };
        if body.is_empty() {
            return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
        }

        let mut frequency = None;
        let mut count = None;
        let mut until = None;
        let mut by_day = Vec::new();
        let mut pattern_parts: Vec<&str> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for part in body.split(';').filter(|p| !p.trim().is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| EngineError::InvalidRule(format!("malformed rule part '{part}'")))?;
            let key = key.trim().to_ascii_uppercase();
            let value = value.trim();
            if seen.contains(&key) {
                return Err(EngineError::InvalidRule(format!("duplicate {key} in '{s}'")));
            }
            seen.push(key.clone());

            match key.as_str() {
                "FREQ" => {
                    frequency = Some(value.parse::<Frequency>()?);
                    pattern_parts.push(part);
                }
                "COUNT" => {
                    // Zero is accepted; it expands to nothing.
                    let n = value.parse::<u32>().map_err(|_| {
                        EngineError::InvalidRule(format!("invalid COUNT value '{value}'"))
                    })?;
                    count = Some(n);
                }
                "UNTIL" => until = Some(Until::parse(value)?),
                "BYDAY" => {
                    by_day = value
                        .split(',')
                        .map(parse_byday_entry)
                        .collect::<Result<Vec<_>>>()?;
                    pattern_parts.push(part);
                }
                _ => pattern_parts.push(part),
            }
        }

        let frequency =
            frequency.ok_or_else(|| EngineError::InvalidRule(format!("'{s}' has no FREQ")))?;

        Ok(RecurrenceRule {
            raw,
            frequency,
            count,
            until,
            by_day,
            pattern: pattern_parts.join(";"),
        })
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse one BYDAY entry such as `MO`, `2TU` or `-1FR`, keeping only the weekday.
fn parse_byday_entry(entry: &str) -> Result<Weekday> {
    let entry = entry.trim();
    let invalid = || EngineError::InvalidRule(format!("invalid BYDAY entry '{entry}'"));
    if entry.len() < 2 || !entry.is_char_boundary(entry.len() - 2) {
        return Err(invalid());
    }
    let (ordinal, day) = entry.split_at(entry.len() - 2);
    if !ordinal.is_empty() && ordinal.parse::<i32>().is_err() {
        return Err(invalid());
    }
    match day.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => Err(invalid()),
    }
}
