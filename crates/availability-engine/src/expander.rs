//! RRULE expansion -- turns an anchor start and a recurrence rule into the
//! occurrence starts that fall inside a query window.
//!
//! The pattern is expanded by the `rrule` crate from a `DTSTART;TZID=` anchor,
//! so BYDAY and friends follow the anchor's local calendar and DST changes keep
//! the local wall-clock time. COUNT and UNTIL are applied here on the lazy
//! stream, which lets open-ended rules be clipped to a window without ever
//! materializing the whole series.

use std::iter::Peekable;

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::dst::{self, DstPolicy};
use crate::error::{EngineError, Result};
use crate::interval::Interval;
use crate::model::{Occurrence, RecurringSeries, ScheduleWindow};
use crate::rule::RecurrenceRule;

/// Explicit inclusions (RDATE) and exclusions (EXDATE) applied on top of a rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionExtras {
    pub rdates: Vec<DateTime<Tz>>,
    pub exdates: Vec<DateTime<Tz>>,
}

#[derive(Debug, Clone)]
struct RuleStream {
    set: RRuleSet,
    count: Option<u32>,
    until: Option<DateTime<Utc>>,
    /// Sub-second part of the anchor, which DTSTART cannot carry.
    subsec: Duration,
}

/// A lazy, restartable sequence of occurrence starts inside a closed window.
///
/// Nothing is computed until [`Occurrences::iter`] is driven; every call to
/// `iter` starts again from the first occurrence.
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: DateTime<Tz>,
    rule: Option<RuleStream>,
    rdates: Vec<DateTime<Utc>>,
    exdates: Vec<DateTime<Utc>>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

impl Occurrences {
    /// Iterate occurrence starts in chronological order, in the anchor's zone.
    pub fn iter(&self) -> impl Iterator<Item = DateTime<Tz>> + '_ {
        let tz = self.anchor.timezone();
        let window_start = self.window_start;
        let window_end = self.window_end;

        Ascending::new(self.generated(), self.rdates.iter().copied())
            .filter(move |dt| self.exdates.binary_search(dt).is_err())
            .skip_while(move |dt| *dt < window_start)
            .take_while(move |dt| *dt <= window_end)
            .map(move |dt| dt.with_timezone(&tz))
    }

    /// Collect every occurrence start in the window.
    pub fn to_vec(&self) -> Vec<DateTime<Tz>> {
        self.iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Instances produced by the rule alone (or the bare anchor), before
    /// RDATE/EXDATE and window clipping. COUNT is applied here so that it
    /// counts generated instances, as RFC 5545 requires.
    fn generated(&self) -> Box<dyn Iterator<Item = DateTime<Utc>> + '_> {
        match &self.rule {
            None => Box::new(std::iter::once(self.anchor.with_timezone(&Utc))),
            Some(stream) => {
                let limit = stream.count.map_or(usize::MAX, |c| c as usize);
                let until = stream.until;
                let subsec = stream.subsec;
                Box::new(
                    (&stream.set)
                        .into_iter()
                        .map(|dt| dt.with_timezone(&Utc))
                        .take(limit)
                        .take_while(move |dt| until.is_none_or(|bound| *dt <= bound))
                        .map(move |dt| dt + subsec),
                )
            }
        }
    }
}

/// Expand `rule` from `anchor_start`, keeping starts within `[window_start, window_end]`.
///
/// With no rule, the result is the anchor itself iff it lies inside the window.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule cannot be expanded.
pub fn expand(
    anchor_start: DateTime<Tz>,
    rule: Option<&RecurrenceRule>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Occurrences> {
    expand_with_extras(
        anchor_start,
        rule,
        window_start,
        window_end,
        &ExpansionExtras::default(),
    )
}

/// Identical to [`expand`] but merges RDATE inclusions and removes EXDATE
/// exclusions (RFC 5545 Section 3.8.5).
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule cannot be expanded.
pub fn expand_with_extras(
    anchor_start: DateTime<Tz>,
    rule: Option<&RecurrenceRule>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    extras: &ExpansionExtras,
) -> Result<Occurrences> {
    let tz = anchor_start.timezone();

    let rule = match rule {
        Some(rule) => Some(RuleStream {
            set: build_rule_set(anchor_start, rule)?,
            count: rule.count(),
            until: rule.until().map(|u| u.bound(tz)),
            subsec: Duration::nanoseconds(i64::from(anchor_start.nanosecond())),
        }),
        None => None,
    };

    Ok(Occurrences {
        anchor: anchor_start,
        rule,
        rdates: sorted_utc(&extras.rdates),
        exdates: sorted_utc(&extras.exdates),
        window_start,
        window_end,
    })
}

/// Materialize the occurrences of `series` whose start lies in `[window_start, window_end]`.
pub fn expand_series(
    series: &RecurringSeries,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Occurrence>> {
    let starts = expand(series.anchor.start, series.rule.as_ref(), window_start, window_end)?;
    Ok(starts
        .iter()
        .map(|start| Occurrence {
            start,
            end: occurrence_end(&series.anchor, start),
        })
        .collect())
}

/// Materialize the occurrences of `series` that overlap `window`, including
/// ones that started before it.
pub fn occurrences_overlapping(
    series: &RecurringSeries,
    window: &Interval<DateTime<Utc>>,
) -> Result<Vec<Occurrence>> {
    // A day of slack absorbs wall-clock ends stretched by a DST change.
    let lookback = series.anchor.duration() + Duration::days(1);
    let occurrences = expand_series(series, window.start - lookback, window.end)?;
    Ok(occurrences
        .into_iter()
        .filter(|o| o.interval().overlaps(window))
        .collect())
}

/// End of the occurrence starting at `start`: the anchor's wall-clock length
/// laid onto the occurrence's local day.
pub fn occurrence_end(anchor: &ScheduleWindow, start: DateTime<Tz>) -> DateTime<Tz> {
    let tz = start.timezone();
    let length = anchor.end.with_timezone(&tz).naive_local() - anchor.start.naive_local();
    dst::resolve_local(tz, start.naive_local() + length, DstPolicy::WallClock)
        .filter(|end| *end > start)
        .unwrap_or(start + anchor.duration())
}

fn build_rule_set(anchor: DateTime<Tz>, rule: &RecurrenceRule) -> Result<RRuleSet> {
    let rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        anchor.timezone().name(),
        anchor.format("%Y%m%dT%H%M%S"),
        rule.pattern()
    );
    rrule_text
        .parse::<RRuleSet>()
        .map_err(|e| EngineError::InvalidRule(format!("{}: {}", rule, e)))
}

fn sorted_utc(instants: &[DateTime<Tz>]) -> Vec<DateTime<Utc>> {
    let mut out: Vec<DateTime<Utc>> = instants.iter().map(|dt| dt.with_timezone(&Utc)).collect();
    out.sort();
    out.dedup();
    out
}

/// Merge two ascending streams into one ascending stream without duplicates.
struct Ascending<A: Iterator, B: Iterator> {
    a: Peekable<A>,
    b: Peekable<B>,
}

impl<A, B> Ascending<A, B>
where
    A: Iterator<Item = DateTime<Utc>>,
    B: Iterator<Item = DateTime<Utc>>,
{
    fn new(a: A, b: B) -> Self {
        Self {
            a: a.peekable(),
            b: b.peekable(),
        }
    }
}

impl<A, B> Iterator for Ascending<A, B>
where
    A: Iterator<Item = DateTime<Utc>>,
    B: Iterator<Item = DateTime<Utc>>,
{
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let next_a = self.a.peek().copied();
        let next_b = self.b.peek().copied();
        match (next_a, next_b) {
            (Some(x), Some(y)) if x < y => self.a.next(),
            (Some(x), Some(y)) if y < x => self.b.next(),
            (Some(_), Some(_)) => {
                self.b.next();
                self.a.next()
            }
            (Some(_), None) => self.a.next(),
            (None, Some(_)) => self.b.next(),
            (None, None) => None,
        }
    }
}
