//! Human-facing summary of a series: a frequency label and the next few dates.

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;

use crate::error::Result;
use crate::expander::expand;
use crate::model::RecurringSeries;
use crate::rule::Frequency;

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceSummary {
    /// "One Time", "Daily", "Weekly", "Monthly" or "Yearly".
    pub label: &'static str,
    /// Weekdays named in BYDAY, if any.
    pub weekdays: Vec<Weekday>,
    /// The first occurrence starts, at most `limit` of them.
    pub upcoming: Vec<DateTime<Tz>>,
}

/// Summarize `series`, listing at most `limit` occurrences from its anchor.
///
/// Only the requested prefix is expanded, so open-ended rules are safe.
pub fn summarize(series: &RecurringSeries, limit: usize) -> Result<RecurrenceSummary> {
    let Some(rule) = &series.rule else {
        return Ok(RecurrenceSummary {
            label: "One Time",
            weekdays: Vec::new(),
            upcoming: vec![series.anchor.start].into_iter().take(limit).collect(),
        });
    };

    let occurrences = expand(
        series.anchor.start,
        Some(rule),
        series.anchor.start.with_timezone(&Utc),
        DateTime::<Utc>::MAX_UTC,
    )?;

    Ok(RecurrenceSummary {
        label: frequency_label(rule.frequency()),
        weekdays: rule.weekdays().to_vec(),
        upcoming: occurrences.iter().take(limit).collect(),
    })
}

pub fn frequency_label(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "Daily",
        Frequency::Weekly => "Weekly",
        Frequency::Monthly => "Monthly",
        Frequency::Yearly => "Yearly",
    }
}
