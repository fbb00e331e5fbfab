//! Plain data consumed and produced by the engine.
//!
//! Rooms and bookings are owned by the CRUD layer; the engine only reads the
//! schedule data they carry and never mutates it.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::rule::RecurrenceRule;

/// A single occurrence's wall-clock span in its governing zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl ScheduleWindow {
    /// Build a window, rejecting `end <= start`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidWindow(format!(
                "end {} must be after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// The zone the window's local calendar is read in.
    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when start and end fall on the same calendar day of the governing zone.
    pub fn is_same_local_day(&self) -> bool {
        let tz = self.timezone();
        self.start.date_naive() == self.end.with_timezone(&tz).date_naive()
    }

    pub fn ensure_same_local_day(&self) -> Result<()> {
        if self.is_same_local_day() {
            Ok(())
        } else {
            Err(EngineError::InvalidWindow(format!(
                "booking must start and end on the same day ({} to {})",
                self.start.to_rfc3339(),
                self.end.to_rfc3339()
            )))
        }
    }

    pub fn interval(&self) -> Interval<DateTime<Utc>> {
        Interval::new(self.start.with_timezone(&Utc), self.end.with_timezone(&Utc))
    }
}

/// An anchor window plus an optional rule repeating it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringSeries {
    pub anchor: ScheduleWindow,
    pub rule: Option<RecurrenceRule>,
}

impl RecurringSeries {
    pub fn single(anchor: ScheduleWindow) -> Self {
        Self { anchor, rule: None }
    }

    pub fn recurring(anchor: ScheduleWindow, rule: RecurrenceRule) -> Self {
        Self {
            anchor,
            rule: Some(rule),
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }

    pub fn timezone(&self) -> Tz {
        self.anchor.timezone()
    }
}

/// One materialized instance of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Occurrence {
    pub fn interval(&self) -> Interval<DateTime<Utc>> {
        Interval::new(self.start.with_timezone(&Utc), self.end.with_timezone(&Utc))
    }
}

/// Booking lifecycle states as stored by the booking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Cancelled,
    Completed,
}

/// An existing booking for a resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub series: RecurringSeries,
    pub status: BookingStatus,
    /// Label reported when this reservation blocks a candidate (the visitor name).
    pub owner: String,
}

impl Reservation {
    pub fn new(series: RecurringSeries, owner: impl Into<String>) -> Self {
        Self {
            series,
            status: BookingStatus::Confirmed,
            owner: owner.into(),
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    /// Cancelled bookings no longer occupy the room.
    pub fn occupies(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// A bookable resource and its standing opening schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: i64,
    pub schedule: RecurringSeries,
    pub is_active: bool,
}

impl Resource {
    pub fn new(id: i64, schedule: RecurringSeries) -> Self {
        Self {
            id,
            schedule,
            is_active: true,
        }
    }
}

/// Busy series for a resource: every reservation that still occupies it.
pub fn busy_series(reservations: &[Reservation]) -> Vec<RecurringSeries> {
    reservations
        .iter()
        .filter(|r| r.occupies())
        .map(|r| r.series.clone())
        .collect()
}
