//! Spawns the parallel search workers (the teacher's process-parallel search
//! realized as native OS threads rather than OS processes, SPEC_FULL §5) and
//! picks the global max-`bestScore` winner (SPEC_FULL §4.5).

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tracing::{error, info, info_span};

use crate::config::Config;
use crate::error::WorkerCrash;
use crate::io_shapes::{EclipseSet, PowerModel, TargetValueTable, WinningPlan};
use crate::mcts::{Engine, Sorter, Tree};
use crate::objective::total_score;
use crate::plan_variable::PlanVariableTables;
use crate::satellite_state::SatelliteState;
use crate::simulator::RolloutSimulator;

/// Per-worker outcome, reported regardless of success so the caller can see
/// every worker's contribution (SPEC_FULL §4.6).
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub random_choice_pct: u32,
    pub best_score: Option<f64>,
    pub rollouts_run: u32,
    pub crashed: Option<String>,
}

/// Runs `config.planner.process_count` worker threads to completion and
/// returns the max-`best_score` winner (if any worker produced one) plus
/// every worker's summary. A worker whose thread panics mid-rollout is
/// excluded from the comparison and logged as a [`WorkerCrash`], never
/// propagated to the caller (SPEC_FULL §4.6, §7).
pub fn run(
    config: &Config,
    tables: &PlanVariableTables,
    target_values: &TargetValueTable,
    power: &PowerModel,
    eclipse: &EclipseSet,
) -> (Option<WinningPlan>, Vec<WorkerSummary>) {
    let tables = Arc::new(tables.clone());
    let target_values = Arc::new(target_values.clone());
    let power = *power;
    let eclipse = Arc::new(eclipse.clone());
    let config = Arc::new(config.clone());
    let shared_tree: Option<Arc<Mutex<Tree>>> = config.planner.shared_tree.then(|| Arc::new(Mutex::new(Tree::new())));

    let handles: Vec<(usize, thread::JoinHandle<(Option<WinningPlan>, WorkerSummary)>)> = (0..config.planner.process_count)
        .map(|worker_id| {
            let tables = Arc::clone(&tables);
            let target_values = Arc::clone(&target_values);
            let eclipse = Arc::clone(&eclipse);
            let config = Arc::clone(&config);
            let shared_tree = shared_tree.clone();
            let handle = thread::Builder::new()
                .name(format!("planner-worker-{worker_id}"))
                .spawn(move || run_worker(worker_id, &config, &tables, &target_values, &power, &eclipse, shared_tree))
                .expect("spawning a worker thread");
            (worker_id, handle)
        })
        .collect();

    let mut summaries = Vec::with_capacity(handles.len());
    let mut winner: Option<WinningPlan> = None;

    for (worker_id, handle) in handles {
        match handle.join() {
            Ok((plan, summary)) => {
                if let Some(plan) = &plan {
                    let better = winner.as_ref().map_or(true, |w| plan.best_score > w.best_score);
                    if better {
                        winner = Some(plan.clone());
                    }
                }
                summaries.push(summary);
            }
            Err(payload) => {
                let crash = WorkerCrash {
                    worker_id,
                    message: panic_message(&payload),
                };
                error!(worker_id = crash.worker_id, message = %crash.message, "worker panicked");
                summaries.push(WorkerSummary {
                    worker_id,
                    random_choice_pct: 0,
                    best_score: None,
                    rollouts_run: 0,
                    crashed: Some(crash.message),
                });
            }
        }
    }

    info!(
        workers = summaries.len(),
        best_score = ?winner.as_ref().map(|w| w.best_score),
        "pool finished"
    );
    (winner, summaries)
}

fn run_worker(
    worker_id: usize,
    config: &Config,
    tables: &PlanVariableTables,
    target_values: &TargetValueTable,
    power: &PowerModel,
    eclipse: &EclipseSet,
    shared_tree: Option<Arc<Mutex<Tree>>>,
) -> (Option<WinningPlan>, WorkerSummary) {
    let span = info_span!("worker", worker_id);
    let _enter = span.enter();

    let random_choice_pct = random_choice_pct_for_worker(config, worker_id);
    let sorter = if config.planner.greedy || config.planner.all_greedy {
        Sorter::heuristic()
    } else {
        Sorter::Random
    };
    let seed = config.rng_seed.map(|s| s.wrapping_add(worker_id as u64));
    let mut engine = match shared_tree {
        Some(tree) => Engine::new_shared(sorter, random_choice_pct, seed, tree),
        None => Engine::new(sorter, random_choice_pct, seed),
    };

    let mut best: Option<WinningPlan> = None;
    let deadline = config.planner.time_limit.map(|d| Instant::now() + d);
    let mut rollouts_run = 0u32;

    for _ in 0..config.planner.rollout_limit {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if engine.is_exhausted() {
            break;
        }

        let mut states = initial_states(config, power);
        engine.begin_rollout();
        let mut sim = RolloutSimulator::new(
            &tables.all,
            &tables.active_order,
            &tables.gp_index,
            target_values,
            config,
            power,
            eclipse,
        );
        sim.run(&mut states, &mut engine);

        let (score, _) = total_score(&states);
        engine.finish_rollout(score);
        rollouts_run += 1;

        if best.as_ref().map_or(true, |b| score > b.best_score) {
            best = Some(WinningPlan {
                worker_id,
                random_choice_pct,
                best_score: score,
                best_state: states,
            });
        }
    }

    info!(rollouts_run, best_score = ?best.as_ref().map(|b| b.best_score), "worker finished");

    let summary = WorkerSummary {
        worker_id,
        random_choice_pct,
        best_score: best.as_ref().map(|b| b.best_score),
        rollouts_run,
        crashed: None,
    };
    (best, summary)
}

fn initial_states(config: &Config, power: &PowerModel) -> HashMap<String, SatelliteState> {
    config
        .satellites
        .iter()
        .map(|s| (s.clone(), SatelliteState::new(power.initial_e())))
        .collect()
}

/// Worker `i`'s random-choice percentage (SPEC_FULL §4.5's monotonic/constant
/// rules): `allGreedy` pins every worker to pure greedy (0); `greedy` without
/// `allGreedy` spreads `0..=100` evenly across the pool so the fleet samples
/// the whole greedy/random spectrum; otherwise every worker is pure random
/// (100).
fn random_choice_pct_for_worker(config: &Config, worker_id: usize) -> u32 {
    let planner = &config.planner;
    if planner.all_greedy {
        0
    } else if planner.greedy {
        let denom = planner.process_count.saturating_sub(1).max(1);
        (((worker_id * 100) / denom) as u32).min(100)
    } else {
        100
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}
