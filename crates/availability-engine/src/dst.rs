//! DST transition policies and local-calendar helpers.
//!
//! Every local-day computation in the engine goes through this module so that
//! midnight, UNTIL and occurrence ends are resolved in the governing zone and
//! never by assuming UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Policy for handling local times that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DstPolicy {
    /// Skip local times that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid local time after the gap
    ShiftForward,
    /// Keep the wall-clock reading and apply the offset in effect before the gap,
    /// so 02:30 in a one-hour gap lands on 03:30.
    #[default]
    WallClock,
}

/// Resolve a naive local datetime in `tz` under the given policy.
///
/// Ambiguous times (the repeated hour when clocks fall back) resolve to the
/// earlier instant. Returns `None` only for [`DstPolicy::Skip`] inside a gap.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Tz>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt);
    }

    match policy {
        DstPolicy::Skip => None,
        DstPolicy::ShiftForward => {
            // Gaps are at most a few hours; a day of minutes is a generous bound.
            (1..=24 * 60)
                .map(|m| naive + Duration::minutes(m))
                .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        }
        DstPolicy::WallClock => {
            let before = tz
                .from_local_datetime(&(naive - Duration::hours(24)))
                .earliest()?;
            let offset = before.offset().fix().local_minus_utc();
            let utc = naive - Duration::seconds(i64::from(offset));
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// The first instant of `date` in `tz`.
///
/// Zones that jump over midnight start the day at the first valid time after it.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    resolve_local(tz, naive, DstPolicy::ShiftForward)
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// Half-open `[start, end)` bounds of a local calendar day, as UTC instants.
pub fn local_day_bounds(tz: Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (
        local_midnight(tz, date).with_timezone(&Utc),
        local_midnight(tz, next).with_timezone(&Utc),
    )
}

/// Local calendar date of `instant` as observed in `tz`.
pub fn local_date(tz: Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
