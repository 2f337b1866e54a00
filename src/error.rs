//! Error taxonomy for the reflow core.
//!
//! Grounded on `chronologic`'s `error.rs`: a small, hand-rolled `enum`
//! implementing [`std::error::Error`] and [`Display`] by hand rather than
//! through a derive macro crate. The core never depends on `thiserror`;
//! this module is the reason why it doesn't need to.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors raised while constructing calendar data (shifts, maintenance
/// windows).
///
/// These are load-time validation errors, matching the recommendation in
/// the design notes to reject out-of-range shift hours rather than
/// silently normalise them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShiftError {
    /// `start_hour` was outside `0..=23` or `end_hour` was outside `0..=24`.
    HourOutOfRange,
    /// A shift's start and end hour describe an empty interval.
    EmptyShift,
    /// `day` was not in `1..=7` (1 = Monday).
    InvalidDayOfWeek,
    /// A maintenance window's `end` did not come strictly after its `start`.
    NonPositiveWindow,
}

impl Error for ShiftError {}

impl Display for ShiftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftError::HourOutOfRange => "shift hour out of range",
            ShiftError::EmptyShift => "shift start and end hour describe an empty interval",
            ShiftError::InvalidDayOfWeek => "day of week must be in 1..=7 (1 = Monday)",
            ShiftError::NonPositiveWindow => "maintenance window end must be strictly after start",
        })
    }
}

/// The calculator's "cannot place" signal.
///
/// This is not a fault: it is the value the calculator legitimately
/// returns when no working instant can be found. Every caller inside the
/// pipeline treats both variants identically (leave the work order's
/// timestamps untouched); the checker reports them with distinct
/// diagnostic text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CalculatorError {
    /// No shift occurrence was found within the lookahead bound.
    NoAvailability,
    /// The iteration cap was reached before `remaining` minutes were consumed.
    IterationCapExceeded,
}

impl Error for CalculatorError {}

impl Display for CalculatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CalculatorError::NoAvailability => "no working period found within the lookahead bound",
            CalculatorError::IterationCapExceeded => "calculator iteration cap exceeded",
        })
    }
}

/// A convenient alias for `Result<T, CalculatorError>`.
pub type CalculatorResult<T> = Result<T, CalculatorError>;

/// Unifies the crate's fallible-construction errors.
///
/// The pipeline itself never returns this: every pipeline-level failure
/// surfaces through [`crate::model::ReflowResult::infeasible`] instead.
/// It exists for callers assembling input documents who want one error
/// type across `Shift::new`, `MaintenanceWindow::new` and the calculator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReflowError {
    Shift(ShiftError),
    Calculator(CalculatorError),
}

impl Error for ReflowError {}

impl Display for ReflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReflowError::Shift(e) => write!(f, "{e}"),
            ReflowError::Calculator(e) => write!(f, "{e}"),
        }
    }
}

impl From<ShiftError> for ReflowError {
    fn from(e: ShiftError) -> Self {
        ReflowError::Shift(e)
    }
}

impl From<CalculatorError> for ReflowError {
    fn from(e: CalculatorError) -> Self {
        ReflowError::Calculator(e)
    }
}
