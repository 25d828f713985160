//! The rollout simulator: drives one full walk of all active plan variables,
//! asking a policy to pick each command and propagating the resulting
//! constraints (SPEC_FULL §4.2).

mod propagate;

use std::collections::{HashMap, VecDeque};

use crate::config::{Config, StorageConfig};
use crate::energy;
use crate::io_shapes::{EclipseSet, PowerModel, TargetValueTable};
use crate::plan_variable::{Command, Domain, GpIndex, Variable};
use crate::satellite_state::SatelliteState;

/// Anything that can pick a command given a variable and its current domain.
/// The MCTS engine is the production implementer; tests may supply a simple
/// closure-backed policy. Mirrors the teacher's `Policy` trait shape
/// (`select_actions`), collapsed to one decision at a time since a rollout
/// must observe the simulator's state between every choice.
pub trait ChoicePolicy {
    fn choose_value(
        &mut self,
        variable: &Variable,
        choices: &Domain,
        state: &SatelliteState,
        target_values: &TargetValueTable,
    ) -> Command;
}

/// Drives one rollout: pops active variables in chronological order, applies
/// the forced-downlink filter, asks the policy for a command, updates state,
/// and propagates the resulting domain narrowing.
pub struct RolloutSimulator<'a> {
    domains: HashMap<Variable, Domain>,
    remaining: VecDeque<Variable>,
    gp_index: &'a GpIndex,
    target_values: &'a TargetValueTable,
    storage: StorageConfig,
    power: &'a PowerModel,
    eclipse: &'a EclipseSet,
    horizon_start: i64,
}

impl<'a> RolloutSimulator<'a> {
    pub fn new(
        all_domains: &HashMap<Variable, Domain>,
        active_order: &[Variable],
        gp_index: &'a GpIndex,
        target_values: &'a TargetValueTable,
        config: &'a Config,
        power: &'a PowerModel,
        eclipse: &'a EclipseSet,
    ) -> Self {
        let mut domains = HashMap::with_capacity(active_order.len());
        for v in active_order {
            domains.insert(v.clone(), all_domains[v].clone());
        }
        let mut sim = Self {
            domains,
            remaining: active_order.iter().cloned().collect(),
            gp_index,
            target_values,
            storage: config.storage,
            power,
            eclipse,
            horizon_start: config.horizon_start,
        };
        sim.remove_initial_infeasible_choices();
        sim
    }

    /// Pre-rollout pass narrowing against the initial (empty-storage) state;
    /// only the "storage empty" DNL-stripping case can fire since no RAW has
    /// happened yet (SPEC_FULL §4.2).
    fn remove_initial_infeasible_choices(&mut self) {
        let satellites: Vec<String> = self
            .remaining
            .iter()
            .map(|v| v.satellite.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        for sat in satellites {
            propagate::strip_until_opportunity(&mut self.domains, &mut self.remaining, &sat, false);
        }
    }

    /// Runs the rollout to completion, mutating `states` (one entry per
    /// satellite, pre-populated by the caller) in place.
    pub fn run(&mut self, states: &mut HashMap<String, SatelliteState>, policy: &mut dyn ChoicePolicy) {
        while let Some(variable) = self.remaining.pop_front() {
            let Some(mut choices) = self.domains.remove(&variable) else {
                continue;
            };
            let state = states
                .get(&variable.satellite)
                .expect("satellite state pre-populated for every registered satellite");
            force_downlink_if_storage_not_empty(&mut choices, state);

            let cmd = policy.choose_value(&variable, &choices, state, self.target_values);

            let state = states.get_mut(&variable.satellite).expect("satellite state exists");
            self.update_state(state, &variable, &cmd);
            self.propagate_choice(states, &variable, &cmd);
        }
    }

    fn update_state(&self, state: &mut SatelliteState, variable: &Variable, cmd: &Command) {
        match cmd {
            Command::Raw(gps) => {
                let value: f64 = gps.iter().map(|gp| self.target_values.value_of(*gp)).sum();
                state.observe(variable.second, gps.clone(), value, self.storage.collection_rate_per_sec, self.storage.capacity);
            }
            Command::Dnl(_) => {
                state.downlink(variable.second, self.storage.downlink_rate_per_sec);
            }
            Command::Idl | Command::Gap => {}
        }
        energy::apply_tick(state, &variable.satellite, variable.second, cmd, self.power, self.eclipse, self.horizon_start);
        state.push_plan_step(variable.clone(), cmd.clone(), variable.second);
    }

    fn propagate_choice(&mut self, states: &HashMap<String, SatelliteState>, variable: &Variable, cmd: &Command) {
        let state = &states[&variable.satellite];

        if cmd.is_raw() && state.is_storage_full(self.storage.capacity, self.storage.collection_rate_per_sec) {
            propagate::strip_until_opportunity(&mut self.domains, &mut self.remaining, &variable.satellite, true);
        }
        if cmd.is_dnl() && state.is_storage_empty() {
            propagate::strip_until_opportunity(&mut self.domains, &mut self.remaining, &variable.satellite, false);
        }
        if let Command::Raw(gps) = cmd {
            for gp in gps {
                propagate::strip_observed_gp(&mut self.domains, &mut self.remaining, self.gp_index, variable, *gp);
            }
        }
    }
}

/// If the satellite's storage is non-empty and a `DNL.*` choice is on offer,
/// `IDL` must not be legal (SPEC_FULL §4.2's forced-downlink law). Asserts
/// `IDL` was present before removal; the active-variable filter guarantees
/// gap variables (where `IDL` is absent) never reach this path.
pub fn force_downlink_if_storage_not_empty(choices: &mut Domain, state: &SatelliteState) {
    let has_dnl = choices.iter().any(Command::is_dnl);
    if !state.is_storage_empty() && has_dnl {
        let idl_pos = choices.iter().position(Command::is_idl);
        assert!(idl_pos.is_some(), "IDL must be present before forced removal");
        choices.remove(idl_pos.unwrap());
    }
}
