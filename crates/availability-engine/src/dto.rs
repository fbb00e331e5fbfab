//! Serde-friendly request and response shapes for the booking service.
//!
//! Inputs carry ISO 8601 strings exactly as stored on room and booking records
//! (`recurrence_rule` is `""` when there is none). Outputs render instants as
//! RFC 3339 with the resource's local offset.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::availability::{DayAvailability, FreeSlot};
use crate::conflict::ConflictResult;
use crate::dst::{self, DstPolicy};
use crate::error::{EngineError, ErrorKind, Result};
use crate::model::{BookingStatus, RecurringSeries, Reservation, Resource, ScheduleWindow};
use crate::rule::RecurrenceRule;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Anchor window and rule as stored on a room or booking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesInput {
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(default)]
    pub recurrence_rule: String,
}

impl SeriesInput {
    /// Convert to a series in `tz`.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidDatetime`, `InvalidWindow` or `InvalidRule`
    /// for malformed fields.
    pub fn to_series(&self, tz: Tz) -> Result<RecurringSeries> {
        let anchor = ScheduleWindow::new(
            parse_datetime(&self.start_datetime, tz)?,
            parse_datetime(&self.end_datetime, tz)?,
        )?;
        Ok(RecurringSeries {
            anchor,
            rule: RecurrenceRule::parse_optional(&self.recurrence_rule)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationInput {
    #[serde(flatten)]
    pub series: SeriesInput,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(alias = "visitor_name")]
    pub owner: String,
}

impl ReservationInput {
    pub fn to_reservation(&self, tz: Tz) -> Result<Reservation> {
        Ok(Reservation::new(self.series.to_series(tz)?, self.owner.clone()).with_status(self.status))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInput {
    pub id: i64,
    #[serde(flatten)]
    pub series: SeriesInput,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ResourceInput {
    pub fn to_resource(&self, tz: Tz) -> Result<Resource> {
        Ok(Resource {
            id: self.id,
            schedule: self.series.to_series(tz)?,
            is_active: self.is_active,
        })
    }
}

/// Parse an ISO 8601 datetime into `tz`.
///
/// Strings with an offset are converted to `tz`. Naive strings are wall-clock
/// times in `tz`, never UTC; a naive time inside a DST gap is rejected.
pub fn parse_datetime(s: &str, tz: Tz) -> Result<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&tz));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| EngineError::InvalidDatetime(format!("'{}': {}", s, e)))?;
    dst::resolve_local(tz, naive, DstPolicy::Skip).ok_or_else(|| {
        EngineError::InvalidDatetime(format!("'{}' does not exist in {}", s, tz.name()))
    })
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotDto {
    pub start: String,
    pub end: String,
}

impl From<&FreeSlot> for SlotDto {
    fn from(slot: &FreeSlot) -> Self {
        Self {
            start: slot.start.to_rfc3339(),
            end: slot.end.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayAvailabilityDto {
    /// Local calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub slots: Vec<SlotDto>,
}

impl From<&DayAvailability> for DayAvailabilityDto {
    fn from(day: &DayAvailability) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            slots: day.slots.iter().map(SlotDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookableResponse {
    pub resource_id: i64,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictResponse {
    pub conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_end: Option<String>,
}

impl From<&ConflictResult> for ConflictResponse {
    fn from(result: &ConflictResult) -> Self {
        match result.conflict() {
            Some(c) => Self {
                conflict: true,
                conflicting_owner: Some(c.owner.clone()),
                conflicting_start: Some(c.start.to_rfc3339()),
                conflicting_end: Some(c.end.to_rfc3339()),
            },
            None => Self {
                conflict: false,
                conflicting_owner: None,
                conflicting_start: None,
                conflicting_end: None,
            },
        }
    }
}

/// Structured error report: `{kind, message}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(e: &EngineError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
