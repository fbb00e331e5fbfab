//! Actual end instant of a booking series.
//!
//! The booking service stores this next to each booking so that listings can
//! filter on it without expanding rules. It is derived, never authoritative.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{EngineError, Result};
use crate::expander::{expand, occurrence_end};
use crate::model::ScheduleWindow;
use crate::rule::RecurrenceRule;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesEnd {
    /// The series is over at this instant.
    At(DateTime<Tz>),
    /// No COUNT or UNTIL: the series never terminates on its own.
    OpenEnded,
}

/// Resolved end plus the reason a fallback was used, if one was.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualEnd {
    pub end: SeriesEnd,
    /// Set when the end could not be computed and `anchor.end` was used instead.
    pub warning: Option<String>,
}

impl ActualEnd {
    fn exact(end: SeriesEnd) -> Self {
        Self { end, warning: None }
    }

    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Resolve when a series actually ends: the end of its last occurrence.
///
/// - No rule: `anchor.end`.
/// - Rule without COUNT and UNTIL: [`SeriesEnd::OpenEnded`].
/// - Otherwise the full finite expansion's last start plus the anchor's length.
///
/// This never fails. If the rule cannot be expanded, or expands to nothing,
/// the result falls back to `anchor.end` with [`ActualEnd::warning`] set and a
/// warning is logged; callers should surface it rather than hide it.
pub fn resolve_actual_end(anchor: &ScheduleWindow, rule: Option<&RecurrenceRule>) -> ActualEnd {
    let Some(rule) = rule else {
        return ActualEnd::exact(SeriesEnd::At(anchor.end));
    };
    if !rule.is_finite() {
        return ActualEnd::exact(SeriesEnd::OpenEnded);
    }

    match last_start(anchor, rule) {
        Ok(last) => ActualEnd::exact(SeriesEnd::At(occurrence_end(anchor, last))),
        Err(e) => {
            warn!(
                rule = %rule,
                error = %e,
                "could not resolve series end, falling back to anchor end"
            );
            ActualEnd {
                end: SeriesEnd::At(anchor.end),
                warning: Some(e.to_string()),
            }
        }
    }
}

fn last_start(anchor: &ScheduleWindow, rule: &RecurrenceRule) -> Result<DateTime<Tz>> {
    let occurrences = expand(
        anchor.start,
        Some(rule),
        anchor.start.with_timezone(&Utc),
        DateTime::<Utc>::MAX_UTC,
    )?;
    let last = occurrences.iter().last();
    last.ok_or_else(|| {
        EngineError::EmptyRecurrence(format!(
            "'{}' from {} produces no occurrences",
            rule,
            anchor.start.to_rfc3339()
        ))
    })
}
