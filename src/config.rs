//! Typed configuration surface mirroring SPEC_FULL §6's recognized options,
//! plus the ambient (non-domain) knobs every worker pool needs: an RNG seed
//! for reproducible rollouts.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Onboard storage parameters, shared by every satellite.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StorageConfig {
    pub capacity: f64,
    pub collection_rate_per_sec: f64,
    pub downlink_rate_per_sec: f64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity: 5772.0,
            collection_rate_per_sec: 96.2172,
            downlink_rate_per_sec: 4.0,
        }
    }
}

/// MCTS search parameters (SPEC_FULL §4.5).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlannerConfig {
    pub rollout_limit: u32,
    pub process_count: usize,
    pub greedy: bool,
    pub all_greedy: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub time_limit: Option<Duration>,
    /// Root-parallel mode: every worker searches one arena behind a shared
    /// lock instead of growing its own tree (SPEC_FULL §4.5, §9). Off by
    /// default; independent trees avoid lock contention and are the teacher's
    /// original process-parallel design.
    pub shared_tree: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            rollout_limit: 40_000,
            process_count: 10,
            greedy: false,
            all_greedy: false,
            time_limit: None,
            shared_tree: false,
        }
    }
}

/// Top-level configuration. Construct with [`Config::new`] or
/// `Config::default()` followed by field edits and [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub satellites: Vec<String>,
    pub horizon_start: i64,
    pub horizon_duration: i64,
    pub storage: StorageConfig,
    pub planner: PlannerConfig,
    pub power_model: String,
    /// Fixed RNG seed for reproducible rollouts. Absent a seed, each worker
    /// seeds from entropy (SPEC_FULL §6).
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Builds a `Config` with the literal domain defaults plus the given
    /// satellite roster, validating cross-field invariants.
    pub fn new(satellites: Vec<String>) -> Result<Self, PlannerError> {
        let config = Self {
            satellites,
            horizon_start: 0,
            horizon_duration: 86_400,
            storage: StorageConfig::default(),
            planner: PlannerConfig::default(),
            power_model: "default".to_string(),
            rng_seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.horizon_duration <= 0 {
            return Err(PlannerError::InvalidConfig(
                "horizon_duration must be positive".to_string(),
            ));
        }
        if self.planner.process_count == 0 {
            return Err(PlannerError::InvalidConfig(
                "planner.process_count must be at least 1".to_string(),
            ));
        }
        if self.planner.rollout_limit == 0 {
            return Err(PlannerError::InvalidConfig(
                "planner.rollout_limit must be at least 1".to_string(),
            ));
        }
        if self.storage.capacity <= 0.0 {
            return Err(PlannerError::InvalidConfig(
                "storage.capacity must be positive".to_string(),
            ));
        }
        if self.storage.collection_rate_per_sec < 0.0 || self.storage.downlink_rate_per_sec < 0.0 {
            return Err(PlannerError::InvalidConfig(
                "storage rates must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn horizon_end(&self) -> i64 {
        self.horizon_start + self.horizon_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_planner_config_matches_domain_defaults() {
        let p = PlannerConfig::default();
        assert_eq!(p.rollout_limit, 40_000);
        assert_eq!(p.process_count, 10);
        assert!(!p.greedy);
        assert!(!p.all_greedy);
        assert!(!p.shared_tree);
    }

    #[test]
    fn new_validates_successfully_with_defaults() {
        let config = Config::new(vec!["S1".to_string()]).unwrap();
        assert_eq!(config.horizon_end(), 86_400);
    }

    #[test]
    fn rejects_zero_horizon_duration() {
        let mut config = Config::new(vec![]).unwrap();
        config.horizon_duration = 0;
        assert!(matches!(config.validate(), Err(PlannerError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_process_count() {
        let mut config = Config::new(vec![]).unwrap();
        config.planner.process_count = 0;
        assert!(config.validate().is_err());
    }
}
