//! Per-satellite dynamic state carried through one rollout.

use crate::plan_variable::{Command, Variable};

/// One observed image: the ground points it covers, its value, and how much
/// of it has been downlinked so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: u32,
    pub value: f64,
    pub targets: Vec<u32>,
    /// Fraction of this image's data downlinked, in `[0, 1]`, monotone
    /// non-decreasing across the plan.
    pub downlink_pct: f64,
    /// Storage units this image occupies, fixed at creation time.
    pub size: f64,
    pub start_tick: i64,
    pub end_tick: Option<i64>,
}

impl Image {
    pub fn is_fully_downlinked(&self) -> bool {
        self.downlink_pct >= 1.0
    }

    /// Latency from observation to full downlink, if it has completed.
    pub fn latency(&self) -> Option<i64> {
        self.end_tick.map(|end| end - self.start_tick)
    }
}

/// Dynamic per-satellite state, reset at the start of every rollout.
#[derive(Debug, Clone, Default)]
pub struct SatelliteState {
    pub storage_used: f64,
    pub energy: f64,
    pub images: Vec<Image>,
    pub plan: Vec<(Variable, Command)>,
    /// The last tick at which any command executed for this satellite, used
    /// by the energy model in place of the Python source's `-1` sentinel
    /// (SPEC_FULL §9). `None` means no tick has executed yet.
    pub last_tick: Option<i64>,
}

impl SatelliteState {
    pub fn new(initial_energy: f64) -> Self {
        Self {
            energy: initial_energy,
            ..Default::default()
        }
    }

    /// Storage is considered full once one more `RAW` would overflow it
    /// (SPEC_FULL §4.2's lookahead threshold, not equality).
    pub fn is_storage_full(&self, capacity: f64, collection_rate_per_sec: f64) -> bool {
        self.storage_used > capacity - collection_rate_per_sec
    }

    pub fn is_storage_empty(&self) -> bool {
        self.storage_used <= 0.0
    }

    /// Adds `collection_rate_per_sec` worth of storage and records a new
    /// image covering `targets`. Asserts the result does not exceed capacity;
    /// callers are expected to have already checked [`Self::is_storage_full`]
    /// before choosing `RAW`, so a violation here is a propagation bug.
    pub fn observe(&mut self, tick: i64, targets: Vec<u32>, gp_value: f64, collection_rate_per_sec: f64, capacity: f64) {
        self.storage_used = round3(self.storage_used + collection_rate_per_sec);
        assert!(
            self.storage_used <= capacity,
            "storage overflow: {} > {capacity}",
            self.storage_used
        );
        let id = self.images.len() as u32 + 1;
        self.images.push(Image {
            id,
            value: round5(gp_value),
            targets,
            downlink_pct: 0.0,
            size: collection_rate_per_sec,
            start_tick: tick,
            end_tick: None,
        });
    }

    /// Subtracts `downlink_rate_per_sec` worth of storage (clamped at 0) and
    /// advances `downlink_pct` on the current downlink image, chaining
    /// overflow across as many subsequent images as the budget requires
    /// (the fix for the Python source's single-overflow-image bug, SPEC_FULL
    /// §9).
    pub fn downlink(&mut self, tick: i64, downlink_rate_per_sec: f64) {
        let actual = downlink_rate_per_sec.min(self.storage_used);
        self.storage_used = round3((self.storage_used - downlink_rate_per_sec).max(0.0));

        let mut budget = actual;
        let mut idx = self.current_downlink_image_index();
        while budget > 0.0 {
            let Some(i) = idx else { break };
            let image = &mut self.images[i];
            let remaining = (1.0 - image.downlink_pct) * image.size;
            let applied = budget.min(remaining);
            image.downlink_pct = (image.downlink_pct + applied / image.size).min(1.0);
            if image.is_fully_downlinked() && image.end_tick.is_none() {
                image.end_tick = Some(tick);
            }
            budget -= applied;
            idx = self.next_image_index_after(i);
        }
    }

    /// First image not yet fully downlinked, in observation order.
    pub fn current_downlink_image_index(&self) -> Option<usize> {
        self.images.iter().position(|img| !img.is_fully_downlinked())
    }

    fn next_image_index_after(&self, i: usize) -> Option<usize> {
        self.images
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(_, img)| !img.is_fully_downlinked())
            .map(|(j, _)| j)
    }

    pub fn push_plan_step(&mut self, variable: Variable, cmd: Command, tick: i64) {
        self.plan.push((variable, cmd));
        self.last_tick = Some(tick);
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round5(x: f64) -> f64 {
    (x * 100_000.0).round() / 100_000.0
}
