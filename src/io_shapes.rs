//! In-memory shapes for the data this crate's external collaborators
//! (file readers and writers, out of scope per SPEC_FULL §1) produce and
//! consume. This crate never touches a filesystem path; a caller-supplied
//! reader constructs these directly, and a caller-supplied writer formats
//! [`WinningPlan`]/[`PlanReport`] into whatever file layout it wants.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::plan_variable::Variable;

/// One line of an access-window file: a satellite can see `gp_ids` from
/// `source_id` at `second`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccessWindowEntry {
    pub satellite: String,
    pub second: i64,
    pub source_id: String,
    pub gp_ids: Vec<u32>,
}

/// One ground-contact window: every inclusive second in `[start, end]` is a
/// `DNL` opportunity to `ground_station`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroundContactWindow {
    pub satellite: String,
    pub ground_station: String,
    pub start: i64,
    pub end: i64,
}

/// One eclipse window: `powerIn` contributes nothing for every inclusive
/// second in `[start, end]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EclipseWindow {
    pub satellite: String,
    pub start: i64,
    pub end: i64,
}

/// Scalar value of one ground point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetValue {
    pub gp_id: u32,
    pub value: f64,
}

/// One named entry of the power-config mapping. The `"default"` entry is
/// merged with the selected model by the caller before this struct is built;
/// this crate just consumes the fully-resolved values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerModel {
    pub max_charge: f64,
    pub min_charge_pct: f64,
    pub initial_charge_pct: f64,
    pub power_in: f64,
    pub idle_power_out: f64,
    pub sensor_power_out: f64,
    pub downlink_power_out: f64,
}

impl PowerModel {
    /// `maxE = maxCharge * 3600` (SPEC_FULL §4.4).
    pub fn max_e(&self) -> f64 {
        self.max_charge * 3600.0
    }

    /// `minE = maxE * minChargePct / 100`.
    pub fn min_e(&self) -> f64 {
        self.max_e() * self.min_charge_pct / 100.0
    }

    /// `initialE = maxE * initialChargePct / 100`.
    pub fn initial_e(&self) -> f64 {
        self.max_e() * self.initial_charge_pct / 100.0
    }
}

/// Eclipse windows keyed by satellite, queried by the energy model.
#[derive(Debug, Clone, Default)]
pub struct EclipseSet {
    windows: HashMap<String, Vec<(i64, i64)>>,
}

impl EclipseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_windows(windows: impl IntoIterator<Item = EclipseWindow>) -> Self {
        let mut set = Self::new();
        for w in windows {
            set.windows.entry(w.satellite).or_default().push((w.start, w.end));
        }
        set
    }

    pub fn is_eclipse(&self, satellite: &str, second: i64) -> bool {
        self.windows
            .get(satellite)
            .is_some_and(|ranges| ranges.iter().any(|(s, e)| second >= *s && second <= *e))
    }
}

/// Target-value table, queried when scoring `RAW` candidates.
#[derive(Debug, Clone, Default)]
pub struct TargetValueTable {
    by_gp: HashMap<u32, f64>,
}

impl TargetValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = TargetValue>) -> Self {
        let mut table = Self::new();
        for v in values {
            table.by_gp.insert(v.gp_id, v.value);
        }
        table
    }

    pub fn value_of(&self, gp: u32) -> f64 {
        self.by_gp.get(&gp).copied().unwrap_or(0.0)
    }
}

/// The result a worker publishes and the pool compares by `best_score`.
#[derive(Debug, Clone)]
pub struct WinningPlan {
    pub worker_id: usize,
    pub random_choice_pct: u32,
    pub best_score: f64,
    pub best_state: HashMap<String, crate::satellite_state::SatelliteState>,
}

/// A rendered summary of the winning plan, suitable for a caller-supplied
/// writer to turn into `bestPlan.<sat>.Summary.txt` / `.Details.txt` /
/// `planSim.<sat>.txt` / `<sat>.imageInfo.txt` (SPEC_FULL §6).
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub objective: f64,
    pub per_satellite_subtotal: HashMap<String, f64>,
    pub observed_gp_count: usize,
    /// The full executed plan per satellite, in chronological order.
    pub plan: HashMap<String, Vec<(Variable, String)>>,
    /// The post-run verifier's minimum-battery trace per satellite, the
    /// `planSim.<sat>.txt` footer's "Minimum bat. charge" line (SPEC_FULL
    /// §6, §8).
    pub min_battery: HashMap<String, crate::verifier::MinBatteryTrace>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_model_derives_constants() {
        let pm = PowerModel {
            max_charge: 100.0,
            min_charge_pct: 20.0,
            initial_charge_pct: 80.0,
            power_in: 1.0,
            idle_power_out: 0.1,
            sensor_power_out: 0.2,
            downlink_power_out: 0.3,
        };
        assert_eq!(pm.max_e(), 360_000.0);
        assert_eq!(pm.min_e(), 72_000.0);
        assert_eq!(pm.initial_e(), 288_000.0);
    }

    #[test]
    fn eclipse_set_inclusive_bounds() {
        let set = EclipseSet::from_windows([EclipseWindow {
            satellite: "S1".into(),
            start: 100,
            end: 200,
        }]);
        assert!(set.is_eclipse("S1", 100));
        assert!(set.is_eclipse("S1", 200));
        assert!(!set.is_eclipse("S1", 201));
        assert!(!set.is_eclipse("S2", 150));
    }
}
