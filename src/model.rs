//! The data model (`spec.md` §3): work orders, work centers, manufacturing
//! orders, shifts, maintenance windows, and the result shapes the reflow
//! pipeline emits.

use crate::error::ShiftError;
use crate::ids::{ManufacturingOrderId, WorkCenterId, WorkOrderId};
use crate::time::{Minutes, Timestamp};

/// A weekly-recurring interval of a weekday on which a center is open
/// (`spec.md` §3, §4.1).
///
/// `day` is `1..=7` with `1` = Monday. `start_hour` is `0..=23`,
/// `end_hour` is `0..=24` (`24` encodes "end of day"). If `end_hour <
/// start_hour` the shift spans midnight and ends at `end_hour` of the
/// following day.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    pub day: u8,
    pub start_hour: u8,
    pub end_hour: u8,
}

impl Shift {
    /// Validates the shift per the open question in the design notes:
    /// out-of-range hours and empty shifts are rejected at construction
    /// rather than silently normalised.
    pub fn new(day: u8, start_hour: u8, end_hour: u8) -> Result<Shift, ShiftError> {
        if !(1..=7).contains(&day) {
            return Err(ShiftError::InvalidDayOfWeek);
        }
        if start_hour > 23 || end_hour > 24 {
            return Err(ShiftError::HourOutOfRange);
        }
        if start_hour == end_hour {
            return Err(ShiftError::EmptyShift);
        }
        Ok(Shift { day, start_hour, end_hour })
    }

    /// Whether this shift's end hour is not strictly greater than its
    /// start hour, i.e. it crosses midnight into the following day.
    #[inline]
    pub fn spans_midnight(&self) -> bool {
        self.end_hour < self.start_hour
    }
}

/// An absolute time interval during which no regular work progresses on a
/// center (`spec.md` §3, §4.1).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaintenanceWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl MaintenanceWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<MaintenanceWindow, ShiftError> {
        if !(start < end) {
            return Err(ShiftError::NonPositiveWindow);
        }
        Ok(MaintenanceWindow { start, end })
    }

    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }
}

/// A resource that executes one work order at a time and has a weekly
/// shift calendar plus absolute maintenance windows (`spec.md` §3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkCenter {
    pub id: WorkCenterId,
    pub name: String,
    pub shifts: Vec<Shift>,
    pub maintenance_windows: Vec<MaintenanceWindow>,
}

impl WorkCenter {
    /// Whether this center has any scheduling constraint at all (shifts
    /// or maintenance windows), used by the checker's sub-check #6/#7
    /// gate (`spec.md` §4.2).
    #[inline]
    pub fn has_calendar(&self) -> bool {
        !self.shifts.is_empty() || !self.maintenance_windows.is_empty()
    }
}

/// The parent order whose due date bounds a set of work orders
/// (`spec.md` §3). Fields beyond the due date are opaque to the core.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ManufacturingOrder {
    pub id: ManufacturingOrderId,
    pub due_date: Timestamp,
}

/// A time-bounded unit of manufacturing work assigned to exactly one work
/// center, optionally depending on other work orders (`spec.md` §3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub manufacturing_order_id: ManufacturingOrderId,
    pub work_center_id: WorkCenterId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration: Minutes,
    pub is_maintenance: bool,
    pub dependencies: Vec<WorkOrderId>,
}

/// Old/new start and end for a work order the pipeline moved
/// (`spec.md` §3, §4.3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkOrderChange {
    pub work_order_id: WorkOrderId,
    pub old_start: Timestamp,
    pub new_start: Timestamp,
    pub old_end: Timestamp,
    pub new_end: Timestamp,
}

/// The outcome of one `reflow` invocation (`spec.md` §3, §6).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReflowResult {
    pub work_orders: Vec<WorkOrder>,
    pub changes: Vec<WorkOrderChange>,
    pub explanation: String,
    pub infeasible: bool,
}
