//! Whole-crate black-box scenarios, driving only the public `supervisor`/
//! `Config`/`simulator`/`energy` surface (SPEC_FULL §8's six literal
//! end-to-end scenarios).

use std::collections::HashMap;

use orbital_planner::config::Config;
use orbital_planner::energy;
use orbital_planner::io_shapes::{EclipseSet, EclipseWindow, PowerModel, TargetValue, TargetValueTable};
use orbital_planner::mcts::{Engine, Sorter};
use orbital_planner::objective::aggregate_gp_score;
use orbital_planner::plan_variable::{build_plan_variables, Command, Domain, SecondInput, Variable};
use orbital_planner::satellite_state::SatelliteState;
use orbital_planner::simulator::{ChoicePolicy, RolloutSimulator};
use orbital_planner::{supervisor, worker_pool};

fn generous_power() -> PowerModel {
    PowerModel {
        max_charge: 1_000_000.0,
        min_charge_pct: 0.0,
        initial_charge_pct: 100.0,
        power_in: 1.0,
        idle_power_out: 0.0,
        sensor_power_out: 0.0,
        downlink_power_out: 0.0,
    }
}

/// Scenario 1: a single satellite forced into downlink once storage fills;
/// the all-greedy search must find the uniquely optimal plan.
#[test]
fn scenario_one_forced_downlink_yields_one_point_seven_five_times_value() {
    let satellites = vec![(
        "S1".to_string(),
        vec![
            (2, SecondInput::Access(vec![("src".into(), vec![100])])),
            (3, SecondInput::Access(vec![("src".into(), vec![100])])),
            (4, SecondInput::Access(vec![("src".into(), vec![100])])),
            (5, SecondInput::Downlink("G1".into())),
            (6, SecondInput::Downlink("G1".into())),
            (7, SecondInput::Downlink("G1".into())),
        ],
    )];
    let tables = build_plan_variables(&satellites);

    let mut config = Config::new(vec!["S1".to_string()]).unwrap();
    config.horizon_duration = 10;
    config.storage.capacity = 200.0;
    config.storage.collection_rate_per_sec = 100.0;
    config.storage.downlink_rate_per_sec = 50.0;
    config.planner.all_greedy = true;
    config.planner.process_count = 1;
    config.planner.rollout_limit = 3;
    config.rng_seed = Some(1);

    let power = generous_power();
    let eclipse = EclipseSet::new();
    let target_values = TargetValueTable::from_values([TargetValue { gp_id: 100, value: 10.0 }]);

    let outcome = supervisor::plan(&config, &tables, &target_values, &power, &eclipse).unwrap();
    let winner = outcome.winner.expect("all-greedy search should find a plan");
    assert_eq!(winner.best_score, 17.5);
}

struct PreferRaw;
impl ChoicePolicy for PreferRaw {
    fn choose_value(
        &mut self,
        _variable: &Variable,
        choices: &Domain,
        _state: &SatelliteState,
        _target_values: &TargetValueTable,
    ) -> Command {
        choices.iter().find(|c| c.is_raw()).cloned().unwrap_or_else(|| choices[0].clone())
    }
}

/// Scenario 2: two satellites with identical access to the same ground
/// point; whichever observes it first strips the other's `RAW` choice down
/// to nothing, collapsing that variable out of the active set.
#[test]
fn scenario_two_dup_target_strip_leaves_one_observer() {
    let satellites = vec![
        ("S1".to_string(), vec![(10, SecondInput::Access(vec![("src".into(), vec![42])]))]),
        ("S2".to_string(), vec![(10, SecondInput::Access(vec![("src".into(), vec![42])]))]),
    ];
    let tables = build_plan_variables(&satellites);

    let config = Config::new(vec!["S1".to_string(), "S2".to_string()]).unwrap();
    let power = generous_power();
    let eclipse = EclipseSet::new();
    let target_values = TargetValueTable::from_values([TargetValue { gp_id: 42, value: 1.0 }]);

    let mut sim = RolloutSimulator::new(
        &tables.all,
        &tables.active_order,
        &tables.gp_index,
        &target_values,
        &config,
        &power,
        &eclipse,
    );
    let mut states: HashMap<String, SatelliteState> = config
        .satellites
        .iter()
        .map(|s| (s.clone(), SatelliteState::new(power.initial_e())))
        .collect();
    let mut policy = PreferRaw;
    sim.run(&mut states, &mut policy);

    // S1 sorts first at a tied second (registration order), so it claims gp
    // 42; S2's variable collapses to IDL and never reaches the policy.
    assert_eq!(states["S1"].images.len(), 1);
    assert_eq!(states["S1"].images[0].targets, vec![42]);
    assert!(states["S2"].images.is_empty());
    assert!(states["S2"].plan.is_empty());
}

/// Scenario 4: an eclipse blocks charging for its whole span; energy
/// monotonically decreases through it and recovers (clamped at `maxE`)
/// once it ends.
#[test]
fn scenario_four_eclipse_blocks_charging_then_recovers() {
    let power = PowerModel {
        max_charge: 1.0,
        min_charge_pct: 0.0,
        initial_charge_pct: 50.0,
        power_in: 2.0,
        idle_power_out: 1.0,
        sensor_power_out: 0.0,
        downlink_power_out: 0.0,
    };
    let eclipse = EclipseSet::from_windows([EclipseWindow {
        satellite: "S1".into(),
        start: 100,
        end: 200,
    }]);
    let mut state = SatelliteState::new(power.initial_e());

    let mut last = state.energy;
    for tick in 100..=200 {
        energy::apply_tick(&mut state, "S1", tick, &Command::Idl, &power, &eclipse, 0);
        state.push_plan_step(Variable::new("S1", tick), Command::Idl, tick);
        assert!(state.energy <= last, "energy must not increase during eclipse");
        last = state.energy;
    }

    for tick in 201..=3_900 {
        energy::apply_tick(&mut state, "S1", tick, &Command::Idl, &power, &eclipse, 0);
        state.push_plan_step(Variable::new("S1", tick), Command::Idl, tick);
    }
    // Once charging saturates the per-tick idle draw still applies before
    // the next tick's `powerIn` is added back, so the fixed point one tick
    // below `maxE` (never above it) is where this settles, not `maxE` itself.
    assert_eq!(state.energy, power.max_e() - power.idle_power_out);
}

/// Scenario 5: the greedy heuristic ranks a higher-value, unobserved ground
/// point ahead of a lower-value one; a pure-random sorter ignores score.
#[test]
fn scenario_five_greedy_ranks_by_value_random_ignores_score() {
    let state = SatelliteState::new(0.0);
    let targets = TargetValueTable::from_values([
        TargetValue { gp_id: 1, value: 0.9 },
        TargetValue { gp_id: 2, value: 0.5 },
    ]);
    let high = aggregate_gp_score(&Command::Raw(vec![1]), &state, &targets);
    let low = aggregate_gp_score(&Command::Raw(vec![2]), &state, &targets);
    assert!(high > low);

    // A random sorter's expand pick is not driven by score: both choices
    // are reachable across repeated fresh engines with a varying seed.
    let domain = vec![Command::Raw(vec![1]), Command::Raw(vec![2])];
    let mut seen = std::collections::HashSet::new();
    for seed in 0..20u64 {
        let mut engine = Engine::new(Sorter::Random, 0, Some(seed));
        engine.begin_rollout();
        let picked = engine.choose_value(&Variable::new("S1", 1), &domain, &state, &targets);
        seen.insert(picked);
    }
    assert_eq!(seen.len(), 2, "uniform random selection should reach both choices over 20 seeds");
}

/// Scenario 6: a parallel pool's global best score is exactly the max of
/// its workers' best scores, and the winner is one specific worker's plan.
#[test]
fn scenario_six_pool_max_law() {
    let satellites = vec![(
        "S1".to_string(),
        vec![
            (2, SecondInput::Access(vec![("src".into(), vec![100])])),
            (5, SecondInput::Downlink("G1".into())),
        ],
    )];
    let tables = build_plan_variables(&satellites);

    let mut config = Config::new(vec!["S1".to_string()]).unwrap();
    config.planner.process_count = 3;
    config.planner.rollout_limit = 50;
    config.rng_seed = Some(7);

    let power = generous_power();
    let eclipse = EclipseSet::new();
    let target_values = TargetValueTable::from_values([TargetValue { gp_id: 100, value: 5.0 }]);

    let (winner, summaries) = worker_pool::run(&config, &tables, &target_values, &power, &eclipse);
    let winner = winner.expect("at least one worker should produce a plan");
    let max_worker_best = summaries
        .iter()
        .filter_map(|s| s.best_score)
        .fold(f64::MIN, f64::max);
    assert_eq!(winner.best_score, max_worker_best);
    assert!(summaries.iter().any(|s| s.worker_id == winner.worker_id));
}
