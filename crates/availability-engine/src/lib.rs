//! # availability-engine
//!
//! Availability and conflict engine for a meeting-room booking service.
//!
//! Expands RFC 5545 recurrence rules in each room's local zone, computes free
//! time for a room over a date range, and decides whether a new (possibly
//! recurring) booking collides with existing ones. Every operation is a pure
//! function of its inputs: the current time is always passed in, nothing is
//! persisted, and no I/O is performed.
//!
//! ## Modules
//!
//! - [`rule`] — RRULE parsing and booking policy (COUNT/UNTIL, supported FREQ)
//! - [`expander`] — anchor + rule → lazy occurrence starts inside a window
//! - [`interval`] — half-open interval overlap, intersection, merge, subtraction
//! - [`availability`] — per-day free slots and "is this window bookable"
//! - [`conflict`] — first collision between a candidate and existing bookings
//! - [`termination`] — actual end instant of a finite series
//! - [`summary`] — frequency label and upcoming dates for display
//! - [`dst`] — DST policies and local-day boundaries
//! - [`model`] — schedule windows, series, reservations, resources
//! - [`dto`] — wire request/response shapes
//! - [`config`] — engine limits and governing zone
//! - [`error`] — Error types

pub mod availability;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod dto;
pub mod error;
pub mod expander;
pub mod interval;
pub mod model;
pub mod rule;
pub mod summary;
pub mod termination;

pub use availability::{free_slots, is_bookable, DayAvailability, FreeSlot};
pub use config::EngineConfig;
pub use conflict::{find_conflict, validate_booking, Conflict, ConflictResult};
pub use error::{EngineError, ErrorKind};
pub use expander::{expand, expand_series, expand_with_extras, ExpansionExtras, Occurrences};
pub use interval::{overlaps, subtract, Interval};
pub use model::{
    BookingStatus, Occurrence, RecurringSeries, Reservation, Resource, ScheduleWindow,
};
pub use rule::{Frequency, RecurrenceRule};
pub use summary::{summarize, RecurrenceSummary};
pub use termination::{resolve_actual_end, ActualEnd, SeriesEnd};
