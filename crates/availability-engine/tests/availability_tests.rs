//! Tests for free-slot computation and bookability checks.

use availability_engine::model::busy_series;
use availability_engine::{
    free_slots, is_bookable, BookingStatus, EngineConfig, EngineError, RecurrenceRule,
    RecurringSeries, Reservation, Resource, ScheduleWindow,
};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::America::Los_Angeles;
use chrono_tz::Australia::Perth;
use chrono_tz::Tz;

fn perth(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
    Perth.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn utc(dt: DateTime<Tz>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Room open Mon-Wed 09:00-18:00 Perth, from Monday 2026-03-02.
fn meeting_room() -> Resource {
    let anchor = ScheduleWindow::new(perth(2026, 3, 2, 9, 0), perth(2026, 3, 2, 18, 0)).unwrap();
    let rule: RecurrenceRule = "FREQ=DAILY;BYDAY=MO,TU,WE".parse().unwrap();
    Resource::new(1, RecurringSeries::recurring(anchor, rule))
}

fn booking(start: DateTime<Tz>, end: DateTime<Tz>) -> RecurringSeries {
    RecurringSeries::single(ScheduleWindow::new(start, end).unwrap())
}

/// A `now` well before every test date.
fn long_ago() -> DateTime<Utc> {
    utc(perth(2026, 1, 1, 0, 0))
}

/// (start hour, start minute, end hour, end minute) in local time.
fn hm(slots: &[availability_engine::FreeSlot]) -> Vec<(u32, u32, u32, u32)> {
    slots
        .iter()
        .map(|s| (s.start.hour(), s.start.minute(), s.end.hour(), s.end.minute()))
        .collect()
}

// ---------------------------------------------------------------------------
// free_slots
// ---------------------------------------------------------------------------

#[test]
fn booking_splits_the_opening() {
    let busy = vec![booking(perth(2026, 3, 16, 11, 0), perth(2026, 3, 16, 12, 0))];

    let days = free_slots(
        &meeting_room(),
        &busy,
        date(2026, 3, 16),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date, date(2026, 3, 16));
    assert_eq!(hm(&days[0].slots), vec![(9, 0, 11, 0), (12, 0, 18, 0)]);
    assert_eq!(days[0].slots[0].duration_minutes, 120);
    assert_eq!(days[0].slots[1].duration_minutes, 360);
}

#[test]
fn overlapping_and_touching_bookings_leave_one_gap() {
    // 10:00-11:30 overlaps 11:00-12:00, which touches 12:00-13:00.
    let busy = vec![
        booking(perth(2026, 3, 16, 11, 0), perth(2026, 3, 16, 12, 0)),
        booking(perth(2026, 3, 16, 12, 0), perth(2026, 3, 16, 13, 0)),
        booking(perth(2026, 3, 16, 10, 0), perth(2026, 3, 16, 11, 30)),
    ];

    let days = free_slots(
        &meeting_room(),
        &busy,
        date(2026, 3, 16),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(hm(&days[0].slots), vec![(9, 0, 10, 0), (13, 0, 18, 0)]);
}

#[test]
fn closed_days_are_omitted() {
    // Mon 16 - Sun 22: only Mon, Tue, Wed are open.
    let days = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 22),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![date(2026, 3, 16), date(2026, 3, 17), date(2026, 3, 18)]);
    assert!(days.iter().all(|d| hm(&d.slots) == vec![(9, 0, 18, 0)]));
}

#[test]
fn fully_booked_day_is_omitted() {
    let busy = vec![booking(perth(2026, 3, 17, 8, 0), perth(2026, 3, 17, 19, 0))];

    let days = free_slots(
        &meeting_room(),
        &busy,
        date(2026, 3, 16),
        date(2026, 3, 18),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![date(2026, 3, 16), date(2026, 3, 18)]);
}

#[test]
fn recurring_busy_series_is_subtracted_each_day() {
    let lunch = RecurringSeries::recurring(
        ScheduleWindow::new(perth(2026, 3, 2, 12, 0), perth(2026, 3, 2, 13, 0)).unwrap(),
        "FREQ=DAILY;UNTIL=20261231".parse().unwrap(),
    );

    let days = free_slots(
        &meeting_room(),
        &[lunch],
        date(2026, 3, 16),
        date(2026, 3, 18),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(days.len(), 3);
    for day in &days {
        assert_eq!(hm(&day.slots), vec![(9, 0, 12, 0), (13, 0, 18, 0)]);
    }
}

#[test]
fn cancelled_reservations_do_not_block() {
    let reservations = vec![
        Reservation::new(
            booking(perth(2026, 3, 16, 9, 0), perth(2026, 3, 16, 18, 0)),
            "Alice",
        )
        .with_status(BookingStatus::Cancelled),
        Reservation::new(
            booking(perth(2026, 3, 16, 10, 0), perth(2026, 3, 16, 11, 0)),
            "Bob",
        ),
    ];

    let days = free_slots(
        &meeting_room(),
        &busy_series(&reservations),
        date(2026, 3, 16),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(hm(&days[0].slots), vec![(9, 0, 10, 0), (11, 0, 18, 0)]);
}

#[test]
fn slot_in_progress_starts_at_now() {
    let now = utc(perth(2026, 3, 16, 14, 27));

    let days = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 16),
        now,
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(days[0].slots.len(), 1);
    assert_eq!(days[0].slots[0].start, perth(2026, 3, 16, 14, 27));
    assert_eq!(days[0].slots[0].end, perth(2026, 3, 16, 18, 0));
    assert_eq!(days[0].slots[0].duration_minutes, 213);
}

#[test]
fn past_slots_are_dropped() {
    let busy = vec![booking(perth(2026, 3, 16, 11, 0), perth(2026, 3, 16, 12, 0))];
    let now = utc(perth(2026, 3, 16, 11, 30));

    let days = free_slots(
        &meeting_room(),
        &busy,
        date(2026, 3, 16),
        date(2026, 3, 16),
        now,
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(hm(&days[0].slots), vec![(12, 0, 18, 0)]);
}

#[test]
fn inactive_resource_has_no_slots() {
    let mut room = meeting_room();
    room.is_active = false;

    let days = free_slots(
        &room,
        &[],
        date(2026, 3, 16),
        date(2026, 3, 18),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert!(days.is_empty());
}

#[test]
fn reversed_query_is_invalid_window() {
    let result = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 18),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    );

    assert!(matches!(result, Err(EngineError::InvalidWindow(_))));
}

#[test]
fn query_longer_than_limit_is_rejected() {
    let config = EngineConfig {
        max_query_days: 7,
        ..EngineConfig::default()
    };

    let ok = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 22),
        long_ago(),
        &config,
    );
    assert!(ok.is_ok(), "7 days inclusive fits a 7-day limit");

    let too_long = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 23),
        long_ago(),
        &config,
    );
    assert_eq!(
        too_long,
        Err(EngineError::WindowTooLarge {
            requested_days: 8,
            max_days: 7
        })
    );
}

#[test]
fn dst_day_keeps_local_opening_hours() {
    // DST starts in Los Angeles on 2026-03-08.
    let anchor = ScheduleWindow::new(
        Los_Angeles.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        Los_Angeles.with_ymd_and_hms(2026, 3, 1, 18, 0, 0).unwrap(),
    )
    .unwrap();
    let room = Resource::new(
        7,
        RecurringSeries::recurring(anchor, "FREQ=DAILY".parse().unwrap()),
    );

    let days = free_slots(
        &room,
        &[],
        date(2026, 3, 7),
        date(2026, 3, 9),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(days.len(), 3);
    for day in &days {
        assert_eq!(hm(&day.slots), vec![(9, 0, 18, 0)], "{}", day.date);
        assert_eq!(day.slots[0].duration_minutes, 540);
    }
}

// ---------------------------------------------------------------------------
// Slot grid
// ---------------------------------------------------------------------------

#[test]
fn slot_starts_on_half_hour_grid() {
    let busy = vec![booking(perth(2026, 3, 16, 11, 0), perth(2026, 3, 16, 12, 0))];
    let days = free_slots(
        &meeting_room(),
        &busy,
        date(2026, 3, 16),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    let starts = days[0].slot_starts(30);

    // 09:00-11:00 gives 4 starts, 12:00-18:00 gives 12.
    assert_eq!(starts.len(), 16);
    assert_eq!(starts[0], perth(2026, 3, 16, 9, 0));
    assert_eq!(starts[3], perth(2026, 3, 16, 10, 30));
    assert_eq!(starts[4], perth(2026, 3, 16, 12, 0));
    assert_eq!(starts[15], perth(2026, 3, 16, 17, 30));
}

#[test]
fn slot_starts_round_up_to_grid() {
    let now = utc(perth(2026, 3, 16, 14, 27));
    let days = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 16),
        now,
        &EngineConfig::default(),
    )
    .unwrap();

    let starts = days[0].slot_starts(30);

    assert_eq!(starts.first(), Some(&perth(2026, 3, 16, 14, 30)));
    assert_eq!(starts.last(), Some(&perth(2026, 3, 16, 17, 30)));
    assert_eq!(starts.len(), 7);
}

#[test]
fn zero_step_yields_no_starts() {
    let days = free_slots(
        &meeting_room(),
        &[],
        date(2026, 3, 16),
        date(2026, 3, 16),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();

    assert!(days[0].slot_starts(0).is_empty());
}

// ---------------------------------------------------------------------------
// is_bookable
// ---------------------------------------------------------------------------

fn bookable(
    busy: &[RecurringSeries],
    start: DateTime<Tz>,
    end: Option<DateTime<Tz>>,
    now: DateTime<Utc>,
) -> Result<bool, EngineError> {
    is_bookable(
        &meeting_room(),
        busy,
        utc(start),
        end.map(utc),
        now,
        &EngineConfig::default(),
    )
}

#[test]
fn free_window_is_bookable() {
    let result = bookable(
        &[],
        perth(2026, 3, 16, 10, 0),
        Some(perth(2026, 3, 16, 11, 0)),
        long_ago(),
    );
    assert_eq!(result, Ok(true));
}

#[test]
fn fully_booked_window_is_not_bookable() {
    let busy = vec![booking(perth(2026, 3, 16, 10, 0), perth(2026, 3, 16, 11, 0))];
    let result = bookable(
        &busy,
        perth(2026, 3, 16, 10, 0),
        Some(perth(2026, 3, 16, 11, 0)),
        long_ago(),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn partially_free_window_is_bookable() {
    let busy = vec![booking(perth(2026, 3, 16, 10, 0), perth(2026, 3, 16, 10, 30))];
    let result = bookable(
        &busy,
        perth(2026, 3, 16, 10, 0),
        Some(perth(2026, 3, 16, 11, 0)),
        long_ago(),
    );
    assert_eq!(result, Ok(true));
}

#[test]
fn window_outside_opening_hours_is_not_bookable() {
    let result = bookable(
        &[],
        perth(2026, 3, 16, 19, 0),
        Some(perth(2026, 3, 16, 20, 0)),
        long_ago(),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn window_touching_closing_time_is_not_bookable() {
    let result = bookable(
        &[],
        perth(2026, 3, 16, 18, 0),
        Some(perth(2026, 3, 16, 19, 0)),
        long_ago(),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn start_is_clamped_to_now() {
    // 09:00-09:30 is free but already past; 09:30-10:00 is booked.
    let busy = vec![booking(perth(2026, 3, 16, 9, 30), perth(2026, 3, 16, 10, 0))];
    let result = bookable(
        &busy,
        perth(2026, 3, 16, 9, 0),
        Some(perth(2026, 3, 16, 10, 0)),
        utc(perth(2026, 3, 16, 9, 30)),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn missing_end_is_bookable() {
    let result = bookable(&[], perth(2026, 3, 16, 10, 0), None, long_ago());
    assert_eq!(result, Ok(true));
}

#[test]
fn end_in_the_past_is_not_bookable() {
    let result = bookable(
        &[],
        perth(2026, 3, 16, 10, 0),
        Some(perth(2026, 3, 16, 11, 0)),
        utc(perth(2026, 3, 17, 0, 0)),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn inactive_resource_is_not_bookable() {
    let mut room = meeting_room();
    room.is_active = false;

    let result = is_bookable(
        &room,
        &[],
        utc(perth(2026, 3, 16, 10, 0)),
        Some(utc(perth(2026, 3, 16, 11, 0))),
        long_ago(),
        &EngineConfig::default(),
    );
    assert_eq!(result, Ok(false));
}

#[test]
fn oversized_candidate_is_rejected() {
    let result = bookable(
        &[],
        perth(2026, 3, 16, 10, 0),
        Some(perth(2027, 6, 1, 10, 0)),
        long_ago(),
    );
    assert!(matches!(result, Err(EngineError::WindowTooLarge { .. })));
}
