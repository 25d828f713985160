//! Per-second energy accumulation (SPEC_FULL §4.4).

use crate::io_shapes::{EclipseSet, PowerModel};
use crate::plan_variable::Command;
use crate::satellite_state::SatelliteState;

/// Advances `state.energy` by one tick's worth of charge/discharge.
///
/// Reads `state.last_tick` as the prior executed tick, defaulting to
/// `horizon_start` rather than a literal `-1` sentinel when the satellite
/// has not executed a tick yet (SPEC_FULL §9, generalizing the Python
/// source's assumption that the horizon always starts at 0). Does not touch
/// `state.last_tick` itself; the caller advances it once the whole tick
/// (storage, images, energy, plan) has been applied.
pub fn apply_tick(
    state: &mut SatelliteState,
    satellite: &str,
    tick: i64,
    cmd: &Command,
    power: &PowerModel,
    eclipse: &EclipseSet,
    horizon_start: i64,
) {
    let prior = state.last_tick.unwrap_or(horizon_start);
    let max_e = power.max_e();

    let mut energy_in = 0.0;
    if state.energy < max_e {
        for t in (prior + 1)..=tick {
            if !eclipse.is_eclipse(satellite, t) {
                energy_in += power.power_in;
            }
        }
    }

    let mut energy_out = power.idle_power_out + power.sensor_power_out;
    if cmd.is_dnl() {
        energy_out += power.downlink_power_out;
    }

    let charged = (state.energy + energy_in).min(max_e);
    state.energy = (charged - energy_out).clamp(0.0, max_e);
}
