//! The post-run verifier (SPEC_FULL §6/§7/§8), grounded on the original
//! source's `simulateAndVerifyPlan`/`verifyState`: re-drives the winning
//! plan's recorded command sequence through a fresh [`SatelliteState`] per
//! satellite, asserting storage and energy never leave their legal ranges,
//! and records the minimum battery charge percentage reached (and the tick
//! it occurred at) for each satellite's trace.

use std::collections::HashMap;

use crate::config::Config;
use crate::energy;
use crate::error::PlannerError;
use crate::io_shapes::{EclipseSet, PowerModel, TargetValueTable};
use crate::plan_variable::Command;
use crate::satellite_state::SatelliteState;

/// The verifier's per-satellite finding: the lowest battery charge
/// percentage observed across its recorded plan, and the tick it occurred
/// at. Defaults to the initial charge at `horizon_start` for a satellite
/// with no executed steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinBatteryTrace {
    pub min_charge_pct: f64,
    pub tick: i64,
}

/// Re-simulates every satellite's recorded plan from a fresh state, checking
/// `storage ∈ [0, capacity]` and `energy ∈ [minE, maxE]` at every step
/// (SPEC_FULL §8). Returns `Err(PlannerError::ConstraintBreach)` on the first
/// violation found; a plan that breaches this was never feasible and the
/// winner it came from must not be trusted.
pub fn verify_plan(
    config: &Config,
    best_state: &HashMap<String, SatelliteState>,
    target_values: &TargetValueTable,
    power: &PowerModel,
    eclipse: &EclipseSet,
) -> Result<HashMap<String, MinBatteryTrace>, PlannerError> {
    let min_e = power.min_e();
    let max_e = power.max_e();

    let mut min_battery = HashMap::with_capacity(best_state.len());

    for (satellite, recorded) in best_state {
        let mut state = SatelliteState::new(power.initial_e());
        let mut trace = MinBatteryTrace {
            min_charge_pct: power.initial_charge_pct,
            tick: config.horizon_start,
        };

        for (variable, cmd) in &recorded.plan {
            match cmd {
                Command::Raw(gps) => {
                    let value: f64 = gps.iter().map(|gp| target_values.value_of(*gp)).sum();
                    state.observe(
                        variable.second,
                        gps.clone(),
                        value,
                        config.storage.collection_rate_per_sec,
                        config.storage.capacity,
                    );
                }
                Command::Dnl(_) => {
                    state.downlink(variable.second, config.storage.downlink_rate_per_sec);
                }
                Command::Idl | Command::Gap => {}
            }
            energy::apply_tick(&mut state, satellite, variable.second, cmd, power, eclipse, config.horizon_start);
            state.push_plan_step(variable.clone(), cmd.clone(), variable.second);

            if state.storage_used < 0.0 || state.storage_used > config.storage.capacity {
                return Err(PlannerError::ConstraintBreach {
                    satellite: satellite.clone(),
                    tick: variable.second,
                    detail: format!("storage {} outside [0, {}]", state.storage_used, config.storage.capacity),
                });
            }
            if state.energy < min_e || state.energy > max_e {
                return Err(PlannerError::ConstraintBreach {
                    satellite: satellite.clone(),
                    tick: variable.second,
                    detail: format!("energy {} outside [{min_e}, {max_e}]", state.energy),
                });
            }

            let charge_pct = state.energy / max_e * 100.0;
            if charge_pct < trace.min_charge_pct {
                trace = MinBatteryTrace {
                    min_charge_pct: charge_pct,
                    tick: variable.second,
                };
            }
        }

        min_battery.insert(satellite.clone(), trace);
    }

    Ok(min_battery)
}
