//! A pure, deterministic schedule-reflow engine for manufacturing work
//! orders: given a set of work orders, the work centers they run on, and
//! the manufacturing orders that bound their due dates, computes a
//! feasible (or provably infeasible) schedule.
//!
//! The crate has three layers, each in its own module:
//!
//! - [`calculator`]: given a start instant and a duration, finds the
//!   instant at which work completes under a center's weekly shift
//!   calendar and absolute maintenance windows.
//! - [`checker`]: validates a candidate schedule against seven
//!   independent constraints and reports every violation found.
//! - [`pipeline`]: [`reflow`] and [`reflow_with_config`], the six-phase
//!   procedure that adjusts a copy of the work orders toward
//!   feasibility and reports what it changed.
//!
//! The engine performs no I/O and emits no logs: it is a pure function
//! of its inputs, meant to be called from a surface that owns those
//! concerns instead.

pub mod calculator;
pub mod checker;
pub mod error;
pub mod ids;
pub mod model;
pub mod pipeline;
pub mod time;

pub use checker::{CheckReport, validate_all};
pub use error::{CalculatorError, CalculatorResult, ReflowError, ShiftError};
pub use ids::{ManufacturingOrderId, WorkCenterId, WorkOrderId};
pub use model::{ManufacturingOrder, MaintenanceWindow, ReflowResult, Shift, WorkCenter, WorkOrder, WorkOrderChange};
pub use pipeline::{ReflowConfig, reflow, reflow_with_config};
pub use time::{Minutes, Timestamp};
