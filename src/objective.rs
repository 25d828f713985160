//! Plan scoring: the search objective and the greedy heuristic's candidate
//! score (SPEC_FULL §4.3).

use std::collections::{HashMap, HashSet};

use crate::io_shapes::TargetValueTable;
use crate::plan_variable::Command;
use crate::satellite_state::SatelliteState;

/// Per-satellite subtotal: `Σ images (value/2 + (value/2) * downlink_pct)`,
/// rounded to 3 decimals. Half the value is earned on observation, the other
/// half linearly as the image is downlinked (SPEC_FULL §4.3).
pub fn satellite_subtotal(state: &SatelliteState) -> f64 {
    let raw: f64 = state
        .images
        .iter()
        .map(|img| img.value / 2.0 + (img.value / 2.0) * img.downlink_pct)
        .sum();
    round3(raw)
}

/// Total objective across all satellites, plus the per-satellite breakdown.
pub fn total_score(states: &HashMap<String, SatelliteState>) -> (f64, HashMap<String, f64>) {
    let mut per_satellite = HashMap::with_capacity(states.len());
    let mut total = 0.0;
    for (sat, state) in states {
        let subtotal = satellite_subtotal(state);
        total += subtotal;
        per_satellite.insert(sat.clone(), subtotal);
    }
    (round3(total), per_satellite)
}

/// The greedy heuristic's score for one candidate command, used to rank
/// simulate/expand-stage choices (SPEC_FULL §4.3). Evaluated against state as
/// it stands before this tick's command is applied.
pub fn aggregate_gp_score(cmd: &Command, state: &SatelliteState, target_values: &TargetValueTable) -> f64 {
    match cmd {
        Command::Raw(gps) => {
            let observed: HashSet<u32> = state.images.iter().flat_map(|img| img.targets.iter().copied()).collect();
            gps.iter()
                .filter(|gp| !observed.contains(gp))
                .map(|gp| target_values.value_of(*gp) / 2.0)
                .sum()
        }
        Command::Dnl(_) => match state.current_downlink_image_index() {
            Some(i) => {
                let image = &state.images[i];
                (image.value / 2.0) * image.downlink_pct
            }
            None => 0.0,
        },
        Command::Idl | Command::Gap => 0.0,
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
