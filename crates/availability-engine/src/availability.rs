//! Free time for a resource, given its opening schedule and its bookings.
//!
//! The resource's own recurring schedule says when it is open; every busy
//! series says when it is taken. Both are expanded over the query window, busy
//! time is subtracted from each opening, and whatever lies in the past
//! relative to the caller-supplied `now` is clipped away.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::config::EngineConfig;
use crate::dst;
use crate::error::{EngineError, Result};
use crate::expander::occurrences_overlapping;
use crate::interval::{self, Interval};
use crate::model::{RecurringSeries, Resource};

/// A free time slot in the resource's local zone.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeSlot {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub duration_minutes: i64,
}

impl FreeSlot {
    fn from_interval(interval: Interval<DateTime<Utc>>, tz: Tz) -> Self {
        Self {
            start: interval.start.with_timezone(&tz),
            end: interval.end.with_timezone(&tz),
            duration_minutes: (interval.end - interval.start).num_minutes(),
        }
    }
}

/// Free slots of one local calendar day, in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<FreeSlot>,
}

impl DayAvailability {
    /// Start times on a `step_minutes` grid (aligned to local midnight) at
    /// which a full step fits inside one of the day's free slots.
    pub fn slot_starts(&self, step_minutes: u32) -> Vec<DateTime<Tz>> {
        if step_minutes == 0 {
            return Vec::new();
        }
        let step = Duration::minutes(i64::from(step_minutes));
        let step_secs = i64::from(step_minutes) * 60;

        let mut starts = Vec::new();
        for slot in &self.slots {
            let into_day = i64::from(slot.start.num_seconds_from_midnight());
            let misalignment = into_day.rem_euclid(step_secs);
            let mut cursor = if misalignment == 0 && slot.start.nanosecond() == 0 {
                slot.start
            } else {
                slot.start.with_nanosecond(0).unwrap_or(slot.start)
                    + Duration::seconds(step_secs - misalignment)
            };
            while cursor + step <= slot.end {
                starts.push(cursor);
                cursor += step;
            }
        }
        starts
    }
}

/// Free slots for `resource` on each local day from `query_start` to `query_end` inclusive.
///
/// Slots ending at or before `now` are dropped and a slot in progress at `now`
/// starts at `now`. Days without free time are omitted. An inactive resource
/// yields no slots.
///
/// # Errors
/// - `EngineError::InvalidWindow` if `query_end` is before `query_start`.
/// - `EngineError::WindowTooLarge` if the span exceeds `config.max_query_days`.
/// - `EngineError::InvalidRule` if any schedule cannot be expanded.
pub fn free_slots(
    resource: &Resource,
    busy: &[RecurringSeries],
    query_start: NaiveDate,
    query_end: NaiveDate,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<Vec<DayAvailability>> {
    if !resource.is_active {
        debug!(resource_id = resource.id, "resource inactive, no free slots");
        return Ok(Vec::new());
    }
    if query_end < query_start {
        return Err(EngineError::InvalidWindow(format!(
            "query end {query_end} is before query start {query_start}"
        )));
    }
    let days = (query_end - query_start).num_days() + 1;
    if days > i64::from(config.max_query_days) {
        return Err(EngineError::WindowTooLarge {
            requested_days: days,
            max_days: config.max_query_days,
        });
    }

    let tz = resource.schedule.timezone();
    let (window_start, _) = dst::local_day_bounds(tz, query_start);
    let (_, window_end) = dst::local_day_bounds(tz, query_end);
    let window = Interval::new(window_start, window_end);

    let free = free_intervals(&resource.schedule, busy, &window)?;

    let mut by_date: BTreeMap<NaiveDate, Vec<FreeSlot>> = BTreeMap::new();
    for slot in free.into_iter().filter_map(|i| clip_to_now(i, now)) {
        by_date
            .entry(dst::local_date(tz, slot.start))
            .or_default()
            .push(FreeSlot::from_interval(slot, tz));
    }

    let result: Vec<DayAvailability> = by_date
        .into_iter()
        .map(|(date, mut slots)| {
            slots.sort_by_key(|s| s.start);
            DayAvailability { date, slots }
        })
        .collect();

    debug!(
        resource_id = resource.id,
        days,
        free_days = result.len(),
        "computed free slots"
    );
    Ok(result)
}

/// Whether any part of `[candidate_start, candidate_end)` is free.
///
/// The start is clamped to `now`. With no end the candidate has no fixed span
/// to occupy and is always bookable; an end already in the past never is. An
/// inactive resource is never bookable.
///
/// # Errors
/// - `EngineError::WindowTooLarge` if the candidate spans more than `config.max_query_days`.
/// - `EngineError::InvalidRule` if any schedule cannot be expanded.
pub fn is_bookable(
    resource: &Resource,
    busy: &[RecurringSeries],
    candidate_start: DateTime<Utc>,
    candidate_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<bool> {
    if !resource.is_active {
        return Ok(false);
    }
    let start = candidate_start.max(now);
    let Some(end) = candidate_end else {
        return Ok(true);
    };
    if end < now || end <= start {
        return Ok(false);
    }

    let span = end - start;
    if span > Duration::days(i64::from(config.max_query_days)) {
        return Err(EngineError::WindowTooLarge {
            requested_days: span.num_days() + 1,
            max_days: config.max_query_days,
        });
    }

    let window = Interval::new(start, end);
    let free = free_intervals(&resource.schedule, busy, &window)?;
    let available = free
        .into_iter()
        .filter_map(|i| clip_to_now(i, now))
        .any(|i| i.overlaps(&window));

    debug!(resource_id = resource.id, available, "checked candidate window");
    Ok(available)
}

/// Free intervals inside `window`: every opening of `schedule` clipped to the
/// window, minus the busy occurrences overlapping that opening.
fn free_intervals(
    schedule: &RecurringSeries,
    busy: &[RecurringSeries],
    window: &Interval<DateTime<Utc>>,
) -> Result<Vec<Interval<DateTime<Utc>>>> {
    let openings: Vec<Interval<DateTime<Utc>>> = occurrences_overlapping(schedule, window)?
        .iter()
        .filter_map(|o| o.interval().intersect(window))
        .collect();
    if openings.is_empty() {
        return Ok(Vec::new());
    }

    let mut busy_blocks: Vec<Interval<DateTime<Utc>>> = Vec::new();
    for series in busy {
        busy_blocks.extend(
            occurrences_overlapping(series, window)?
                .iter()
                .map(|o| o.interval()),
        );
    }
    let taken = interval::merge(&busy_blocks);

    let mut free = Vec::new();
    for opening in openings {
        let blocking: Vec<Interval<DateTime<Utc>>> = taken
            .iter()
            .filter(|b| b.overlaps(&opening))
            .copied()
            .collect();
        free.extend(interval::subtract(opening, &blocking));
    }
    Ok(free)
}

/// Drop what lies before `now`; `None` if nothing is left.
fn clip_to_now(
    interval: Interval<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<Interval<DateTime<Utc>>> {
    if interval.end <= now {
        return None;
    }
    Some(Interval::new(interval.start.max(now), interval.end))
}
