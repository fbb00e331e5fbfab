//! Decide whether a candidate booking collides with existing bookings.
//!
//! The candidate is expanded over a bounded horizon to find its comparison
//! window; every existing booking that still occupies the room is expanded
//! over that same window and each pair of occurrences is tested for overlap.
//! Adjacent occurrences (one ends exactly when another starts) are NOT
//! conflicts.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::config::MAX_CONFLICT_HORIZON_DAYS;
use crate::error::{EngineError, Result};
use crate::expander::{expand_series, occurrences_overlapping};
use crate::interval::Interval;
use crate::model::{Occurrence, RecurringSeries, Reservation};

/// The existing occurrence that blocks a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    /// Owner label of the blocking reservation.
    pub owner: String,
    /// Start of the blocking occurrence.
    pub start: DateTime<Tz>,
    /// End of the blocking occurrence.
    pub end: DateTime<Tz>,
    /// Start of the candidate occurrence it collides with.
    pub candidate_start: DateTime<Tz>,
    pub overlap_minutes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictResult {
    Clear,
    Conflict(Conflict),
}

impl ConflictResult {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ConflictResult::Conflict(_))
    }

    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            ConflictResult::Conflict(c) => Some(c),
            ConflictResult::Clear => None,
        }
    }
}

/// Find the first existing occurrence that overlaps any occurrence of `candidate`.
///
/// Existing reservations are visited in the order given and, within each, by
/// occurrence start, so the reported conflict is deterministic for a fixed
/// input. Cancelled reservations are ignored. A recurring candidate is only
/// expanded `cap_days` past its anchor: series that first meet further out
/// than that are reported as clear.
///
/// # Errors
/// - `EngineError::InvalidRule` if the candidate's rule does not set exactly
///   one of COUNT/UNTIL, or any rule cannot be expanded.
/// - `EngineError::EmptyRecurrence` if the candidate's rule yields no occurrence.
/// - `EngineError::WindowTooLarge` if `cap_days` is beyond the supported horizon.
pub fn find_conflict(
    candidate: &RecurringSeries,
    cap_days: u32,
    existing: &[Reservation],
) -> Result<ConflictResult> {
    if let Some(rule) = &candidate.rule {
        rule.validate_for_booking()?;
    }

    let (window, mine) = comparison_window(candidate, cap_days)?;

    for reservation in existing.iter().filter(|r| r.occupies()) {
        // Pre-filter only; recurring reservations always need expanding.
        if !reservation.series.is_recurring()
            && !reservation.series.anchor.interval().overlaps(&window)
        {
            continue;
        }

        for theirs in occurrences_overlapping(&reservation.series, &window)? {
            let taken = theirs.interval();
            if let Some(hit) = mine.iter().find(|m| m.interval().overlaps(&taken)) {
                let overlap = hit
                    .interval()
                    .intersect(&taken)
                    .map_or(0, |i| (i.end - i.start).num_minutes());
                debug!(
                    owner = %reservation.owner,
                    start = %theirs.start.to_rfc3339(),
                    "booking conflict found"
                );
                return Ok(ConflictResult::Conflict(Conflict {
                    owner: reservation.owner.clone(),
                    start: theirs.start,
                    end: theirs.end,
                    candidate_start: hit.start,
                    overlap_minutes: overlap,
                }));
            }
        }
    }

    Ok(ConflictResult::Clear)
}

/// The span a candidate is compared over, with its occurrences inside it.
///
/// A single booking is compared over its own window. A recurring one is
/// expanded from its anchor for `cap_days` and spans from its first
/// occurrence start to its last occurrence end.
///
/// # Errors
/// - `EngineError::WindowTooLarge` if `cap_days` exceeds
///   [`MAX_CONFLICT_HORIZON_DAYS`] or the horizon runs past the representable range.
/// - `EngineError::EmptyRecurrence` if the rule yields no occurrence.
pub fn comparison_window(
    candidate: &RecurringSeries,
    cap_days: u32,
) -> Result<(Interval<DateTime<Utc>>, Vec<Occurrence>)> {
    let Some(rule) = &candidate.rule else {
        let only = Occurrence {
            start: candidate.anchor.start,
            end: candidate.anchor.end,
        };
        return Ok((candidate.anchor.interval(), vec![only]));
    };

    let too_large = EngineError::WindowTooLarge {
        requested_days: i64::from(cap_days),
        max_days: MAX_CONFLICT_HORIZON_DAYS,
    };
    if cap_days > MAX_CONFLICT_HORIZON_DAYS {
        return Err(too_large);
    }
    let horizon_start = candidate.anchor.start.with_timezone(&Utc);
    let horizon_end = Duration::try_days(i64::from(cap_days))
        .and_then(|span| horizon_start.checked_add_signed(span))
        .ok_or(too_large)?;
    let occurrences = expand_series(candidate, horizon_start, horizon_end)?;

    let (Some(first), Some(last)) = (occurrences.first(), occurrences.last()) else {
        return Err(EngineError::EmptyRecurrence(format!(
            "'{}' from {} produces no bookable occurrence",
            rule,
            candidate.anchor.start.to_rfc3339()
        )));
    };
    let window = Interval::new(
        first.start.with_timezone(&Utc),
        last.end.with_timezone(&Utc),
    );
    Ok((window, occurrences))
}

/// Caller-side preconditions for a booking series: a positive window that
/// starts and ends on the same local day, and a finite booking rule.
pub fn validate_booking(series: &RecurringSeries) -> Result<()> {
    if series.anchor.end <= series.anchor.start {
        return Err(EngineError::InvalidWindow(
            "end datetime must be after start datetime".to_string(),
        ));
    }
    series.anchor.ensure_same_local_day()?;
    if let Some(rule) = &series.rule {
        rule.validate_for_booking()?;
    }
    Ok(())
}
