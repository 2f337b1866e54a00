//! The constraint checker (`spec.md` §4.2).
//!
//! Exposes one composite operation, [`validate_all`], which runs seven
//! independent sub-checks and concatenates their diagnostics. Grounded on
//! the teacher's `TimeGraph` iteration style (borrow the data, iterate,
//! never mutate) adapted from graph traversal to a flat validation pass:
//! the resource model here is a set of named work centers, not a general
//! constraint graph, so there is no propagation to do, only independent
//! queries over the three input collections.

use std::collections::HashMap;

use crate::calculator;
use crate::ids::{ManufacturingOrderId, WorkCenterId};
use crate::model::{ManufacturingOrder, WorkCenter, WorkOrder};

/// Absolute tolerance, in minutes, used when comparing a stored end
/// timestamp against the calculator's recomputed end (`spec.md` §4.2,
/// sub-checks 6 and 7).
pub const TOLERANCE_MINUTES: i64 = 1;

/// The result of [`validate_all`]: a verdict plus the diagnostics that
/// justify it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub ok: bool,
    pub diagnostics: Vec<String>,
}

/// Runs all seven sub-checks over `work_orders`, `work_centers` and
/// `manufacturing_orders` and returns the composite verdict.
pub fn validate_all(
    work_orders: &[WorkOrder],
    work_centers: &[WorkCenter],
    manufacturing_orders: &[ManufacturingOrder],
) -> CheckReport {
    let centers: HashMap<&WorkCenterId, &WorkCenter> = work_centers.iter().map(|c| (&c.id, c)).collect();
    let orders: HashMap<&ManufacturingOrderId, &ManufacturingOrder> =
        manufacturing_orders.iter().map(|o| (&o.id, o)).collect();

    let mut diagnostics = Vec::new();
    check_valid_timestamps(work_orders, &mut diagnostics);
    check_due_dates(work_orders, &orders, &mut diagnostics);
    check_no_overlaps(work_orders, &mut diagnostics);
    check_center_existence(work_orders, &centers, &mut diagnostics);
    check_dependencies(work_orders, &mut diagnostics);
    check_shift_and_maintenance_progression(work_orders, &centers, &mut diagnostics);

    CheckReport { ok: diagnostics.is_empty(), diagnostics }
}

/// Sub-check 1: every work order's start is strictly before its end.
fn check_valid_timestamps(work_orders: &[WorkOrder], diagnostics: &mut Vec<String>) {
    for wo in work_orders {
        if !(wo.start < wo.end) {
            diagnostics.push(format!(
                "work order {} has start {} not strictly before end {}",
                wo.id, wo.start, wo.end
            ));
        }
    }
}

/// Sub-check 2: non-maintenance work orders respect their parent's due date.
fn check_due_dates(
    work_orders: &[WorkOrder],
    orders: &HashMap<&ManufacturingOrderId, &ManufacturingOrder>,
    diagnostics: &mut Vec<String>,
) {
    for wo in work_orders {
        if wo.is_maintenance {
            continue;
        }
        match orders.get(&wo.manufacturing_order_id) {
            None => diagnostics.push(format!(
                "work order {} references unknown manufacturing order {}",
                wo.id, wo.manufacturing_order_id
            )),
            Some(mo) => {
                if wo.end > mo.due_date {
                    diagnostics.push(format!(
                        "work order {} ends at {} after due date {} (impossible to satisfy due date)",
                        wo.id, wo.end, mo.due_date
                    ));
                }
                if mo.due_date < wo.start {
                    diagnostics.push(format!(
                        "work order {} starts at {} after due date {} (impossible to satisfy due date)",
                        wo.id, wo.start, mo.due_date
                    ));
                }
            }
        }
    }
}

/// Sub-check 3: no two work orders sharing a center overlap.
///
/// O(n^2) per center, as the spec allows; realistic work-order counts per
/// center make a sweep unnecessary.
fn check_no_overlaps(work_orders: &[WorkOrder], diagnostics: &mut Vec<String>) {
    let mut by_center: HashMap<&WorkCenterId, Vec<&WorkOrder>> = HashMap::new();
    for wo in work_orders {
        by_center.entry(&wo.work_center_id).or_default().push(wo);
    }
    for (center, orders) in by_center {
        for i in 0..orders.len() {
            for j in (i + 1)..orders.len() {
                let a = orders[i];
                let b = orders[j];
                if a.start < b.end && b.start < a.end {
                    diagnostics.push(format!(
                        "work orders {} and {} overlap on center {}",
                        a.id, b.id, center
                    ));
                }
            }
        }
    }
}

/// Sub-check 4: every referenced work center exists.
fn check_center_existence(
    work_orders: &[WorkOrder],
    centers: &HashMap<&WorkCenterId, &WorkCenter>,
    diagnostics: &mut Vec<String>,
) {
    for wo in work_orders {
        if !centers.contains_key(&wo.work_center_id) {
            diagnostics.push(format!(
                "work order {} references unknown work center {}",
                wo.id, wo.work_center_id
            ));
        }
    }
}

/// Sub-check 5: for every dependency edge `(b depends on a)` where both
/// exist, `a.end <= b.start`.
fn check_dependencies(work_orders: &[WorkOrder], diagnostics: &mut Vec<String>) {
    let by_id: HashMap<_, _> = work_orders.iter().map(|wo| (&wo.id, wo)).collect();
    for b in work_orders {
        for dep_id in &b.dependencies {
            if let Some(a) = by_id.get(dep_id) {
                if a.end > b.start {
                    diagnostics.push(format!(
                        "work order {} depends on {} but {} ends at {} after {} starts at {}",
                        b.id, a.id, a.id, a.end, b.id, b.start
                    ));
                }
            }
        }
    }
}

/// Sub-checks 6 and 7: non-maintenance work orders on a center with at
/// least one shift or maintenance window match the calculator's result
/// within [`TOLERANCE_MINUTES`]. The calculator is the same function for
/// both the shift+maintenance path and the maintenance-only path (an
/// empty shift set); there is exactly one calculator, shared, per the
/// design notes.
fn check_shift_and_maintenance_progression(
    work_orders: &[WorkOrder],
    centers: &HashMap<&WorkCenterId, &WorkCenter>,
    diagnostics: &mut Vec<String>,
) {
    for wo in work_orders {
        if wo.is_maintenance {
            continue;
        }
        let Some(center) = centers.get(&wo.work_center_id) else {
            continue; // already reported by sub-check 4
        };
        if !center.has_calendar() {
            continue;
        }
        match calculator::progress(wo.start, wo.duration, &center.shifts, &center.maintenance_windows) {
            Ok(expected_end) => {
                if (expected_end.diff_minutes(&wo.end)).abs() > TOLERANCE_MINUTES {
                    diagnostics.push(format!(
                        "work order {} end {} does not match calculated end {} (tolerance {}min)",
                        wo.id, wo.end, expected_end, TOLERANCE_MINUTES
                    ));
                }
            }
            Err(e) => diagnostics.push(format!(
                "work order {} on center {}: calculator could not place the work ({e})",
                wo.id, wo.work_center_id
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ManufacturingOrderId, WorkCenterId, WorkOrderId};
    use crate::model::Shift;
    use crate::time::{Minutes, Timestamp};

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn center(id: &str, shifts: Vec<Shift>) -> WorkCenter {
        WorkCenter { id: WorkCenterId::from(id), name: id.to_string(), shifts, maintenance_windows: vec![] }
    }

    fn mo(id: &str, due: &str) -> ManufacturingOrder {
        ManufacturingOrder { id: ManufacturingOrderId::from(id), due_date: ts(due) }
    }

    fn wo(id: &str, mo_id: &str, center_id: &str, start: &str, end: &str, duration: u32) -> WorkOrder {
        WorkOrder {
            id: WorkOrderId::from(id),
            manufacturing_order_id: ManufacturingOrderId::from(mo_id),
            work_center_id: WorkCenterId::from(center_id),
            start: ts(start),
            end: ts(end),
            duration: Minutes(duration),
            is_maintenance: false,
            dependencies: vec![],
        }
    }

    #[test]
    fn reports_no_errors_on_feasible_single_order() {
        let centers = [center("C1", vec![Shift::new(1, 8, 16).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T17:00:00Z")];
        let wos = [wo("WO1", "MO1", "C1", "2024-01-15T08:00:00Z", "2024-01-15T12:00:00Z", 240)];
        let report = validate_all(&wos, &centers, &orders);
        assert!(report.ok, "{:?}", report.diagnostics);
    }

    #[test]
    fn flags_due_date_before_start_as_infeasible() {
        let centers = [center("C1", vec![])];
        let orders = [mo("MO1", "2024-01-14T17:00:00Z")];
        let wos = [wo("WO1", "MO1", "C1", "2024-01-15T08:00:00Z", "2024-01-15T16:00:00Z", 480)];
        let report = validate_all(&wos, &centers, &orders);
        assert!(!report.ok);
        assert!(report.diagnostics.iter().any(|d| d.contains("impossible")));
    }

    #[test]
    fn flags_overlap_on_same_center() {
        let centers = [center("C1", vec![])];
        let orders = [mo("MO1", "2024-02-01T00:00:00Z")];
        let wos = [
            wo("WO-A", "MO1", "C1", "2024-01-15T08:00:00Z", "2024-01-15T12:00:00Z", 240),
            wo("WO-B", "MO1", "C1", "2024-01-15T10:00:00Z", "2024-01-15T14:00:00Z", 240),
        ];
        let report = validate_all(&wos, &centers, &orders);
        assert!(!report.ok);
    }

    #[test]
    fn flags_unknown_center() {
        let orders = [mo("MO1", "2024-02-01T00:00:00Z")];
        let wos = [wo("WO1", "MO1", "C-missing", "2024-01-15T08:00:00Z", "2024-01-15T12:00:00Z", 240)];
        let report = validate_all(&wos, &[], &orders);
        assert!(!report.ok);
        assert!(report.diagnostics.iter().any(|d| d.contains("unknown work center")));
    }

    #[test]
    fn maintenance_work_orders_are_exempt_from_progression_check() {
        let centers = [center("C1", vec![Shift::new(1, 8, 16).unwrap()])];
        let orders = [mo("MO1", "2024-02-01T00:00:00Z")];
        let mut maint = wo("WO-M", "MO1", "C1", "2024-01-15T08:00:00Z", "2024-01-15T09:30:00Z", 90);
        maint.is_maintenance = true;
        let report = validate_all(&[maint], &centers, &orders);
        assert!(report.ok, "{:?}", report.diagnostics);
    }
}
