//! The caller-facing entry point (SPEC_FULL §4.6), grounded on the original
//! source's supervisor: a thin wrapper that builds the worker pool from
//! `Config`, blocks until the whole pool completes, and hands back the
//! winning plan plus a rendered report. The original issues the call as a
//! message handler reacting to a `"start"` event on a queue; there is no
//! cross-process boundary to cross here, so that dispatch collapses to one
//! direct blocking call.

use tracing::info;

use crate::config::Config;
use crate::io_shapes::{EclipseSet, PlanReport, PowerModel, TargetValueTable, WinningPlan};
use crate::plan_variable::PlanVariableTables;
use crate::verifier;
use crate::worker_pool::{self, WorkerSummary};

/// Everything a single planning run returns: the winning plan (if any worker
/// produced one), every worker's summary, and the verified report, for the
/// caller to log or persist as it sees fit.
#[derive(Debug, Clone)]
pub struct PlanningOutcome {
    pub winner: Option<WinningPlan>,
    pub worker_summaries: Vec<WorkerSummary>,
    pub report: Option<PlanReport>,
}

/// Runs the full worker pool to completion, verifies the winner, and returns
/// the result. Mirrors the original source's `supervisorMsgHandler`:
/// validate, dispatch to the pool, publish the winner (SPEC_FULL §4.6), then
/// re-drive it through the post-run verifier (SPEC_FULL §7, §8). A
/// [`crate::error::PlannerError::ConstraintBreach`] from the verifier is
/// fatal and propagates to the caller: a plan that breaches it was never
/// feasible.
pub fn plan(
    config: &Config,
    tables: &PlanVariableTables,
    target_values: &TargetValueTable,
    power: &PowerModel,
    eclipse: &EclipseSet,
) -> Result<PlanningOutcome, crate::error::PlannerError> {
    config.validate()?;

    info!(
        process_count = config.planner.process_count,
        rollout_limit = config.planner.rollout_limit,
        "planning started"
    );

    let (winner, worker_summaries) = worker_pool::run(config, tables, target_values, power, eclipse);

    match &winner {
        Some(w) => info!(best_score = w.best_score, worker_id = w.worker_id, "planning complete"),
        None => info!("planning complete with no winner (every worker crashed)"),
    }

    let report = match &winner {
        Some(w) => Some(render_report(config, w, target_values, power, eclipse)?),
        None => None,
    };

    Ok(PlanningOutcome {
        winner,
        worker_summaries,
        report,
    })
}

/// Renders a [`WinningPlan`] into the summary shape a caller-supplied writer
/// would format into `bestPlan.<sat>.*` files (SPEC_FULL §6), running the
/// post-run verifier (SPEC_FULL §7, §8) to fill in the minimum-battery trace.
pub fn render_report(
    config: &Config,
    winner: &WinningPlan,
    target_values: &TargetValueTable,
    power: &PowerModel,
    eclipse: &EclipseSet,
) -> Result<PlanReport, crate::error::PlannerError> {
    let (objective, per_satellite_subtotal) = crate::objective::total_score(&winner.best_state);

    let observed_gp_count = winner
        .best_state
        .values()
        .flat_map(|s| s.images.iter())
        .flat_map(|img| img.targets.iter())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let plan = winner
        .best_state
        .iter()
        .map(|(sat, state)| {
            let steps = state.plan.iter().map(|(v, c)| (v.clone(), c.to_string())).collect();
            (sat.clone(), steps)
        })
        .collect();

    let min_battery = verifier::verify_plan(config, &winner.best_state, target_values, power, eclipse)?;

    Ok(PlanReport {
        objective,
        per_satellite_subtotal,
        observed_gp_count,
        plan,
        min_battery,
    })
}
