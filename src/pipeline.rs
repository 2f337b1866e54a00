//! The reflow pipeline (`spec.md` §4.3): six ordered passes over a deep
//! copy of the work-order set, followed by the feasibility verdict and
//! the change list.
//!
//! Phases never raise: a work order referencing an unknown center or
//! manufacturing order, or one the calculator cannot place, is left
//! untouched by every phase and reported only by [`crate::checker`]
//! (`spec.md` §7).

use std::collections::HashMap;

use crate::calculator;
use crate::checker::{self, CheckReport};
use crate::ids::{ManufacturingOrderId, WorkCenterId, WorkOrderId};
use crate::model::{ManufacturingOrder, ReflowResult, WorkCenter, WorkOrder, WorkOrderChange};
use crate::time::{Minutes, Timestamp};

/// Tunable bounds for the pipeline and the calculator it drives.
///
/// The teacher carries no configuration surface of its own (it is a pure
/// algebra library); this struct is the ambient config layer a pipeline
/// of this shape needs, modelled on the small `Copy` config structs with
/// a `Default` impl common across the broader scheduling-crate corpus.
/// `ReflowConfig::default()` reproduces `spec.md`'s mandated behaviour
/// exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReflowConfig {
    /// Passed through to the calculator as its iteration cap.
    pub max_calculator_iterations: u32,
    /// Passed through to the calculator as its lookahead bound, in days.
    pub max_lookahead_days: i64,
    /// Bound on phase 2 / phase 2.5 fixed-point iteration. `None` means
    /// "the number of work orders", per `spec.md` §4.3.
    pub max_phase_iterations: Option<usize>,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        ReflowConfig {
            max_calculator_iterations: calculator::MAX_CALCULATOR_ITERATIONS,
            max_lookahead_days: calculator::MAX_LOOKAHEAD_DAYS,
            max_phase_iterations: None,
        }
    }
}

impl ReflowConfig {
    fn phase_iteration_cap(&self, work_order_count: usize) -> usize {
        self.max_phase_iterations.unwrap_or(work_order_count)
    }

    fn compute_end(&self, start: Timestamp, duration: Minutes, center: Option<&WorkCenter>) -> Option<Timestamp> {
        let (shifts, maintenance): (&[_], &[_]) = match center {
            Some(c) => (&c.shifts, &c.maintenance_windows),
            None => (&[], &[]),
        };
        calculator::progress_bounded(start, duration, shifts, maintenance, self.max_calculator_iterations, self.max_lookahead_days).ok()
    }
}

/// Runs the full reflow pipeline using `spec.md`'s default bounds.
pub fn reflow(
    work_orders: &[WorkOrder],
    work_centers: &[WorkCenter],
    manufacturing_orders: &[ManufacturingOrder],
) -> ReflowResult {
    reflow_with_config(work_orders, work_centers, manufacturing_orders, &ReflowConfig::default())
}

/// Runs the full reflow pipeline with explicit bounds.
pub fn reflow_with_config(
    work_orders: &[WorkOrder],
    work_centers: &[WorkCenter],
    manufacturing_orders: &[ManufacturingOrder],
    config: &ReflowConfig,
) -> ReflowResult {
    let centers: HashMap<WorkCenterId, &WorkCenter> = work_centers.iter().map(|c| (c.id.clone(), c)).collect();
    let orders: HashMap<ManufacturingOrderId, &ManufacturingOrder> =
        manufacturing_orders.iter().map(|o| (o.id.clone(), o)).collect();

    // Deep copy: the pipeline never mutates the caller's collection.
    let mut work_orders: Vec<WorkOrder> = work_orders.to_vec();
    let snapshot: Vec<(Timestamp, Timestamp)> = work_orders.iter().map(|wo| (wo.start, wo.end)).collect();

    phase0_normalise_end_dates(&mut work_orders, &centers, config);
    phase1_due_date_violations(&mut work_orders, &orders, &centers, config);
    phase2_precedence(&mut work_orders, &centers, config);
    phase2_5_precedence_due_date_optimisation(&mut work_orders, &orders, &centers, config);
    phase3_overlap_resolution(&mut work_orders, &centers, config);

    let report = checker::validate_all(&work_orders, work_centers, manufacturing_orders);
    let changes = build_change_list(&work_orders, &snapshot);
    let explanation = explain(&report, &changes, work_orders.len());

    ReflowResult {
        work_orders,
        changes,
        explanation,
        infeasible: !report.ok,
    }
}

/// Phase 0: realign every non-maintenance work order's end with the
/// calculator's result for its current start.
fn phase0_normalise_end_dates(work_orders: &mut [WorkOrder], centers: &HashMap<WorkCenterId, &WorkCenter>, config: &ReflowConfig) {
    for wo in work_orders.iter_mut() {
        if wo.is_maintenance {
            continue;
        }
        let center = centers.get(&wo.work_center_id).copied();
        if let Some(end) = config.compute_end(wo.start, wo.duration, center) {
            wo.end = end;
        }
        // "cannot place": leave the work order untouched (spec.md §4.3, §7).
    }
}

/// Phase 1: pull each late work order's start back so its recomputed end
/// lands on the parent's due date.
fn phase1_due_date_violations(
    work_orders: &mut [WorkOrder],
    orders: &HashMap<ManufacturingOrderId, &ManufacturingOrder>,
    centers: &HashMap<WorkCenterId, &WorkCenter>,
    config: &ReflowConfig,
) {
    for wo in work_orders.iter_mut() {
        if wo.is_maintenance {
            continue;
        }
        let Some(mo) = orders.get(&wo.manufacturing_order_id) else {
            continue;
        };
        if wo.end <= mo.due_date {
            continue;
        }
        let tentative_start = mo.due_date - wo.duration;
        let center = centers.get(&wo.work_center_id).copied();
        if let Some(end) = config.compute_end(tentative_start, wo.duration, center) {
            wo.start = tentative_start;
            wo.end = end;
        }
    }
}

/// Phase 2: propagate `a.end <= b.start` along dependency edges to a
/// fixed point, bounded by `N` passes.
fn phase2_precedence(work_orders: &mut [WorkOrder], centers: &HashMap<WorkCenterId, &WorkCenter>, config: &ReflowConfig) {
    let cap = config.phase_iteration_cap(work_orders.len());
    for _ in 0..cap {
        let ends: HashMap<WorkOrderId, Timestamp> = work_orders.iter().map(|wo| (wo.id.clone(), wo.end)).collect();
        let mut changed = false;
        for wo in work_orders.iter_mut() {
            if wo.is_maintenance || wo.dependencies.is_empty() {
                continue;
            }
            let max_dep_end = wo.dependencies.iter().filter_map(|dep| ends.get(dep)).copied().max();
            if let Some(max_dep_end) = max_dep_end {
                if max_dep_end > wo.start {
                    wo.start = max_dep_end;
                    let center = centers.get(&wo.work_center_id).copied();
                    if let Some(end) = config.compute_end(wo.start, wo.duration, center) {
                        wo.end = end;
                    }
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Phase 2.5: opportunistically pull a limiting dependency earlier when
/// doing so helps its dependent meet its own due date, then cascades the
/// dependent forward. Intentionally not a global critical-path
/// computation (`spec.md` §9).
fn phase2_5_precedence_due_date_optimisation(
    work_orders: &mut [WorkOrder],
    orders: &HashMap<ManufacturingOrderId, &ManufacturingOrder>,
    centers: &HashMap<WorkCenterId, &WorkCenter>,
    config: &ReflowConfig,
) {
    let cap = config.phase_iteration_cap(work_orders.len());
    for _ in 0..cap {
        let mut changed = false;
        let snapshot: Vec<WorkOrder> = work_orders.to_vec();
        let by_id: HashMap<&WorkOrderId, &WorkOrder> = snapshot.iter().map(|wo| (&wo.id, wo)).collect();

        for i in 0..work_orders.len() {
            let (is_maintenance, dependencies, duration, due_date, end, id) = {
                let wo = &work_orders[i];
                let Some(mo) = orders.get(&wo.manufacturing_order_id) else {
                    continue;
                };
                (wo.is_maintenance, wo.dependencies.clone(), wo.duration, mo.due_date, wo.end, wo.id.clone())
            };
            if is_maintenance || end <= due_date || dependencies.is_empty() {
                continue;
            }

            // The limiting dependency: the non-maintenance dependency
            // whose current end equals the maximum dependency end.
            let limiting = dependencies
                .iter()
                .filter_map(|dep_id| by_id.get(dep_id).copied())
                .filter(|dep| !dep.is_maintenance)
                .max_by_key(|dep| dep.end);

            let Some(limiting) = limiting else {
                continue;
            };
            let Some(dep_mo) = orders.get(&limiting.manufacturing_order_id) else {
                continue;
            };

            let target_start = due_date - duration;
            if limiting.end <= target_start {
                continue; // limiting dependency is not actually the bottleneck
            }

            let new_dep_end = target_start.min(dep_mo.due_date);
            if new_dep_end >= limiting.end {
                continue; // the move would not reduce the dependency's end
            }
            let new_dep_start = new_dep_end - limiting.duration;

            let dep_center = centers.get(&limiting.work_center_id).copied();
            let Some(recomputed_dep_end) = config.compute_end(new_dep_start, limiting.duration, dep_center) else {
                continue;
            };

            let limiting_id = limiting.id.clone();
            if let Some(dep_wo) = work_orders.iter_mut().find(|wo| wo.id == limiting_id) {
                dep_wo.start = new_dep_start;
                dep_wo.end = recomputed_dep_end;
            }

            if let Some(dependent) = work_orders.iter_mut().find(|wo| wo.id == id) {
                dependent.start = recomputed_dep_end;
                let center = centers.get(&dependent.work_center_id).copied();
                if let Some(end) = config.compute_end(dependent.start, dependent.duration, center) {
                    dependent.end = end;
                }
            }
            changed = true;
        }

        if !changed {
            break;
        }
    }
}

/// Phase 3: within each work center, sweep work orders sorted by current
/// start and push later ones past earlier ones (and past maintenance
/// blockers) to remove overlaps.
fn phase3_overlap_resolution(work_orders: &mut [WorkOrder], centers: &HashMap<WorkCenterId, &WorkCenter>, config: &ReflowConfig) {
    let mut by_center: HashMap<WorkCenterId, Vec<usize>> = HashMap::new();
    for (idx, wo) in work_orders.iter().enumerate() {
        by_center.entry(wo.work_center_id.clone()).or_default().push(idx);
    }

    for (_center_id, mut indices) in by_center {
        indices.sort_by_key(|&idx| work_orders[idx].start);

        let mut cursor: Option<Timestamp> = None;
        for idx in indices {
            if work_orders[idx].is_maintenance {
                cursor = Some(work_orders[idx].end);
                continue;
            }
            match cursor {
                None => cursor = Some(work_orders[idx].end),
                Some(c) => {
                    if work_orders[idx].start < c {
                        work_orders[idx].start = c;
                        let center = centers.get(&work_orders[idx].work_center_id).copied();
                        if let Some(end) = config.compute_end(work_orders[idx].start, work_orders[idx].duration, center) {
                            work_orders[idx].end = end;
                        }
                    }
                    cursor = Some(work_orders[idx].end);
                }
            }
        }
    }
}

fn build_change_list(work_orders: &[WorkOrder], snapshot: &[(Timestamp, Timestamp)]) -> Vec<WorkOrderChange> {
    work_orders
        .iter()
        .zip(snapshot)
        .filter(|(wo, (old_start, old_end))| wo.start != *old_start || wo.end != *old_end)
        .map(|(wo, (old_start, old_end))| WorkOrderChange {
            work_order_id: wo.id.clone(),
            old_start: *old_start,
            new_start: wo.start,
            old_end: *old_end,
            new_end: wo.end,
        })
        .collect()
}

fn explain(report: &CheckReport, changes: &[WorkOrderChange], total: usize) -> String {
    if !report.ok {
        "infeasible".to_string()
    } else if changes.is_empty() {
        "no changes needed".to_string()
    } else {
        format!("{} of {} work orders rescheduled to satisfy constraints.", changes.len(), total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shift;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn center(id: &str, shifts: Vec<Shift>) -> WorkCenter {
        WorkCenter { id: WorkCenterId::from(id), name: id.to_string(), shifts, maintenance_windows: vec![] }
    }

    fn mo(id: &str, due: &str) -> ManufacturingOrder {
        ManufacturingOrder { id: ManufacturingOrderId::from(id), due_date: ts(due) }
    }

    fn wo(id: &str, mo_id: &str, center_id: &str, start: &str, duration: u32) -> WorkOrder {
        WorkOrder {
            id: WorkOrderId::from(id),
            manufacturing_order_id: ManufacturingOrderId::from(mo_id),
            work_center_id: WorkCenterId::from(center_id),
            start: ts(start),
            end: ts(start), // phase 0 fills this in
            duration: Minutes(duration),
            is_maintenance: false,
            dependencies: vec![],
        }
    }

    #[test]
    fn no_op_on_already_feasible_schedule() {
        let centers = [center("C1", vec![Shift::new(1, 8, 16).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T17:00:00Z")];
        let wos = [wo("WO1", "MO1", "C1", "2024-01-15T08:00:00Z", 240)];
        let result = reflow(&wos, &centers, &orders);
        assert!(!result.infeasible);
        assert!(result.changes.is_empty());
        assert_eq!(result.explanation, "no changes needed");
        assert_eq!(result.work_orders[0].end, ts("2024-01-15T12:00:00Z"));
    }

    #[test]
    fn overlap_pushes_second_order_back() {
        let centers = [center("C1", vec![Shift::new(1, 8, 16).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T17:00:00Z")];
        let mut a = wo("WO-A", "MO1", "C1", "2024-01-15T08:00:00Z", 240);
        a.end = ts("2024-01-15T12:00:00Z");
        let mut b = wo("WO-B", "MO1", "C1", "2024-01-15T10:00:00Z", 240);
        b.end = ts("2024-01-15T14:00:00Z");
        let result = reflow(&[a, b], &centers, &orders);
        assert!(!result.infeasible);
        let b_after = result.work_orders.iter().find(|wo| wo.id.as_str() == "WO-B").unwrap();
        assert_eq!(b_after.start, ts("2024-01-15T12:00:00Z"));
        assert_eq!(b_after.end, ts("2024-01-15T16:00:00Z"));
        let a_after = result.work_orders.iter().find(|wo| wo.id.as_str() == "WO-A").unwrap();
        assert_eq!(a_after.start, ts("2024-01-15T08:00:00Z"));
    }

    #[test]
    fn dependency_chain_propagates_through_two_hops() {
        let centers = [center("C1", vec![Shift::new(1, 8, 18).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T00:00:00Z")];
        let mut a = wo("WO-A", "MO1", "C1", "2024-01-15T08:00:00Z", 60);
        a.end = ts("2024-01-15T09:00:00Z");
        let mut b = wo("WO-B", "MO1", "C1", "2024-01-15T08:30:00Z", 120);
        b.end = ts("2024-01-15T10:30:00Z");
        b.dependencies = vec![WorkOrderId::from("WO-A")];
        let mut c = wo("WO-C", "MO1", "C1", "2024-01-15T09:00:00Z", 60);
        c.end = ts("2024-01-15T10:00:00Z");
        c.dependencies = vec![WorkOrderId::from("WO-B")];

        let result = reflow(&[a, b, c], &centers, &orders);
        assert!(!result.infeasible, "{}", result.explanation);
        let by_id: HashMap<_, _> = result.work_orders.iter().map(|wo| (wo.id.as_str(), wo)).collect();
        assert_eq!(by_id["WO-B"].start, ts("2024-01-15T09:00:00Z"));
        assert_eq!(by_id["WO-B"].end, ts("2024-01-15T11:00:00Z"));
        assert_eq!(by_id["WO-C"].start, ts("2024-01-15T11:00:00Z"));
        assert_eq!(by_id["WO-C"].end, ts("2024-01-15T12:00:00Z"));
    }

    #[test]
    fn phase1_can_rescue_a_due_date_violation_by_moving_earlier() {
        // spec.md §4.3 phase 1 has no lower bound: a work order may move
        // to a start before its pre-pipeline start if that is what its
        // due date requires.
        let centers = [center("C1", vec![])];
        let orders = [mo("MO1", "2024-01-14T17:00:00Z")];
        let mut a = wo("WO1", "MO1", "C1", "2024-01-15T08:00:00Z", 480);
        a.end = ts("2024-01-15T16:00:00Z");
        let result = reflow(&[a], &centers, &orders);
        assert!(!result.infeasible, "{}", result.explanation);
        assert_eq!(result.work_orders[0].start, ts("2024-01-14T09:00:00Z"));
        assert_eq!(result.work_orders[0].end, ts("2024-01-14T17:00:00Z"));
    }

    #[test]
    fn infeasible_when_precedence_reintroduces_a_due_date_violation_maintenance_cannot_fix() {
        // Phase 2 (precedence) can reintroduce a due-date violation
        // after phase 1 resolved it; phase 2.5 cannot rescue it here
        // because the limiting dependency is a maintenance work order,
        // which is never eligible to move (spec.md §4.3, §9).
        let centers = [center("C1", vec![])];
        let orders = [mo("MO-A", "2024-01-20T00:00:00Z"), mo("MO-B", "2024-01-15T09:30:00Z")];

        let mut maint = wo("WO-A", "MO-A", "C1", "2024-01-15T08:00:00Z", 60);
        maint.end = ts("2024-01-15T09:00:00Z");
        maint.is_maintenance = true;

        let mut b = wo("WO-B", "MO-B", "C1", "2024-01-15T10:00:00Z", 120);
        b.dependencies = vec![WorkOrderId::from("WO-A")];

        let result = reflow(&[maint, b], &centers, &orders);
        assert!(result.infeasible, "{}", result.explanation);
        assert_eq!(result.explanation, "infeasible");
        let b_after = result.work_orders.iter().find(|wo| wo.id.as_str() == "WO-B").unwrap();
        assert_eq!(b_after.start, ts("2024-01-15T09:00:00Z"));
        assert_eq!(b_after.end, ts("2024-01-15T11:00:00Z"));
    }

    #[test]
    fn maintenance_work_orders_are_never_moved() {
        let centers = [center("C1", vec![Shift::new(1, 8, 18).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T00:00:00Z")];
        let mut maint = wo("WO-M", "MO1", "C1", "2024-01-15T09:00:00Z", 60);
        maint.end = ts("2024-01-15T10:00:00Z");
        maint.is_maintenance = true;
        let mut regular = wo("WO-R", "MO1", "C1", "2024-01-15T09:30:00Z", 60);
        regular.end = ts("2024-01-15T10:30:00Z");

        let result = reflow(&[maint, regular], &centers, &orders);
        let maint_after = result.work_orders.iter().find(|wo| wo.id.as_str() == "WO-M").unwrap();
        assert_eq!(maint_after.start, ts("2024-01-15T09:00:00Z"));
        assert_eq!(maint_after.end, ts("2024-01-15T10:00:00Z"));
    }

    #[test]
    fn idempotent_on_its_own_feasible_output() {
        let centers = [center("C1", vec![Shift::new(1, 8, 18).unwrap()])];
        let orders = [mo("MO1", "2024-01-20T00:00:00Z")];
        let mut a = wo("WO-A", "MO1", "C1", "2024-01-15T08:00:00Z", 240);
        a.end = ts("2024-01-15T13:00:00Z"); // deliberately wrong, phase 0 fixes it
        let mut b = wo("WO-B", "MO1", "C1", "2024-01-15T09:00:00Z", 180);
        b.end = ts("2024-01-15T15:00:00Z");

        let first = reflow(&[a, b], &centers, &orders);
        assert!(!first.infeasible);
        let second = reflow(&first.work_orders, &centers, &orders);
        assert!(!second.infeasible);
        assert!(second.changes.is_empty(), "{:?}", second.changes);
    }
}
