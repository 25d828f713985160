//! An MCTS-driven task planner for a small Earth-observing satellite
//! constellation: given access windows, ground-contact windows, eclipse
//! windows, and per-ground-point target values, searches for a high-value
//! observe/downlink/idle schedule per satellite over a fixed horizon.
//!
//! [`supervisor::plan`] is the main entry point: it builds a
//! [`worker_pool`], blocks until every worker completes, and returns the
//! winning plan plus a renderable [`io_shapes::PlanReport`].

pub mod config;
pub mod energy;
pub mod error;
pub mod io_shapes;
pub mod mcts;
pub mod objective;
pub mod plan_variable;
pub mod satellite_state;
pub mod simulator;
pub mod supervisor;
pub mod verifier;
pub mod worker_pool;

pub use config::Config;
pub use error::PlannerError;
pub use io_shapes::{PlanReport, WinningPlan};
pub use supervisor::{plan, PlanningOutcome};
pub use verifier::MinBatteryTrace;
