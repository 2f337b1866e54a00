//! The shift-and-maintenance work-progression calculator (`spec.md` §4.1).
//!
//! Given a start instant, a duration in whole minutes, a weekly shift
//! calendar and a set of absolute maintenance windows, computes the
//! instant at which the work completes, or signals that no such instant
//! can be reached.
//!
//! The algorithm advances over constraint *boundaries* (shift ends,
//! maintenance window edges), never minute by minute, and is bounded by
//! an explicit iteration cap so it terminates on every input
//! (`spec.md` §5). The teacher's `TimeGraph`/`TimeScheduler` propagate
//! constraints across an abstract graph of instants; here there is no
//! graph to propagate across, only one instant advancing against one
//! calendar, so the algorithm is a direct iterative loop rather than a
//! constraint-propagation pass.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{CalculatorError, CalculatorResult};
use crate::model::{MaintenanceWindow, Shift};
use crate::time::{Minutes, Timestamp};

/// Default iteration cap for the calculator's advancement loop
/// (`spec.md` §4.1: "a hard iteration cap (≥ 1000 is sufficient...)").
pub const MAX_CALCULATOR_ITERATIONS: u32 = 1000;

/// Default lookahead, in days, used to bound "next available day" search
/// (`spec.md` §4.1).
pub const MAX_LOOKAHEAD_DAYS: i64 = 7;

/// Computes the instant at which `duration` minutes of work, started at
/// `start`, complete under `shifts` and `maintenance`, using the spec's
/// default bounds.
pub fn progress(
    start: Timestamp,
    duration: Minutes,
    shifts: &[Shift],
    maintenance: &[MaintenanceWindow],
) -> CalculatorResult<Timestamp> {
    progress_bounded(start, duration, shifts, maintenance, MAX_CALCULATOR_ITERATIONS, MAX_LOOKAHEAD_DAYS)
}

/// Like [`progress`], but with explicit iteration/lookahead bounds,
/// used by [`crate::pipeline::ReflowConfig`] to let callers tighten the
/// bounds (e.g. under test) without changing default behaviour.
pub fn progress_bounded(
    start: Timestamp,
    duration: Minutes,
    shifts: &[Shift],
    maintenance: &[MaintenanceWindow],
    max_iterations: u32,
    max_lookahead_days: i64,
) -> CalculatorResult<Timestamp> {
    let mut t = start;
    let mut remaining = duration.as_i64();

    if remaining <= 0 {
        return Ok(t);
    }

    for _ in 0..max_iterations {
        if remaining <= 0 {
            return Ok(t);
        }

        if let Some(window) = maintenance_containing(maintenance, t) {
            // Maintenance takes precedence even if a shift is active.
            t = window.end;
            continue;
        }

        if shifts.is_empty() {
            match next_maintenance_start_after(maintenance, t, None) {
                None => return Ok(t + Minutes(remaining as u32)),
                Some(window) => {
                    let gap = window.start.diff_minutes(&t);
                    if gap >= remaining {
                        return Ok(t + Minutes(remaining as u32));
                    }
                    remaining -= gap;
                    t = window.start;
                }
            }
        } else {
            match active_shift_end(shifts, t) {
                None => match next_shift_start_after(shifts, t, max_lookahead_days) {
                    None => return Err(CalculatorError::NoAvailability),
                    Some(next_start) => {
                        t = next_start;
                    }
                },
                Some(shift_end) => {
                    let boundary = match next_maintenance_start_after(maintenance, t, Some(shift_end)) {
                        Some(window) => window.start,
                        None => shift_end,
                    };
                    let gap = boundary.diff_minutes(&t);
                    if gap >= remaining {
                        return Ok(t + Minutes(remaining as u32));
                    }
                    remaining -= gap;
                    t = boundary;
                }
            }
        }
    }

    Err(CalculatorError::IterationCapExceeded)
}

fn maintenance_containing<'a>(windows: &'a [MaintenanceWindow], t: Timestamp) -> Option<&'a MaintenanceWindow> {
    windows.iter().find(|w| w.contains(t))
}

/// The maintenance window with the earliest start strictly after `t`,
/// optionally bounded to starts strictly before `before`.
fn next_maintenance_start_after<'a>(
    windows: &'a [MaintenanceWindow],
    t: Timestamp,
    before: Option<Timestamp>,
) -> Option<&'a MaintenanceWindow> {
    windows
        .iter()
        .filter(|w| w.start > t)
        .filter(|w| before.map_or(true, |b| w.start < b))
        .min_by_key(|w| w.start)
}

/// The absolute occurrence `[start, end)` of `shift` that begins on
/// `date`, if `date`'s weekday matches the shift's day.
fn shift_occurrence_on(shift: &Shift, date: NaiveDate) -> Option<(Timestamp, Timestamp)> {
    if date.weekday().number_from_monday() as u8 != shift.day {
        return None;
    }
    let start = date_time_at_hour(date, shift.start_hour as i64);
    let end = if shift.end_hour > shift.start_hour {
        date_time_at_hour(date, shift.end_hour as i64)
    } else {
        // Spans midnight: ends at `end_hour` of the following day.
        date_time_at_hour(date + Duration::days(1), shift.end_hour as i64)
    };
    Some((start, end))
}

fn date_time_at_hour(date: NaiveDate, hour: i64) -> Timestamp {
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    let naive = midnight + Duration::hours(hour);
    Timestamp::new(chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(naive, chrono::Utc))
}

/// The end instant of whichever shift occurrence currently contains `t`,
/// if any. A midnight-spanning shift's occurrence can begin the day
/// before `t`'s date, so both are considered.
fn active_shift_end(shifts: &[Shift], t: Timestamp) -> Option<Timestamp> {
    let date = t.to_datetime().date_naive();
    [date - Duration::days(1), date]
        .into_iter()
        .flat_map(|d| shifts.iter().filter_map(move |s| shift_occurrence_on(s, d)))
        .find(|(start, end)| *start <= t && t < *end)
        .map(|(_, end)| end)
}

/// The earliest shift occurrence start strictly after `t`, searching the
/// day of `t` and up to `max_lookahead_days` following days.
fn next_shift_start_after(shifts: &[Shift], t: Timestamp, max_lookahead_days: i64) -> Option<Timestamp> {
    let date = t.to_datetime().date_naive();
    (0..=max_lookahead_days)
        .flat_map(|offset| {
            let d = date + Duration::days(offset);
            shifts.iter().filter_map(move |s| shift_occurrence_on(s, d))
        })
        .map(|(start, _end)| start)
        .filter(|start| *start > t)
        .min()
}
