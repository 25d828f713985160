//! The scoring capability used at expand/simulate decision points
//! (SPEC_FULL §4.3). A plain `fn` pointer, matching the teacher's
//! lightweight trait-object-free style where a closure's captures aren't
//! needed.

use crate::io_shapes::TargetValueTable;
use crate::objective::aggregate_gp_score;
use crate::plan_variable::{Command, Domain};
use crate::satellite_state::SatelliteState;

/// How a worker picks among several candidate commands. The
/// probability-of-random knob (`random_choice_pct`) lives on the engine, not
/// here, so the same sorter can be reused across workers with different
/// mixes (SPEC_FULL §4.3 Design Notes).
#[derive(Debug, Clone, Copy)]
pub enum Sorter {
    /// Uniform choice, ignoring score entirely.
    Random,
    /// Ranks candidates by the wrapped scoring function, highest first.
    Heuristic(fn(&Command, &SatelliteState, &TargetValueTable) -> f64),
}

impl Sorter {
    /// The default heuristic: [`aggregate_gp_score`].
    pub fn heuristic() -> Self {
        Sorter::Heuristic(aggregate_gp_score)
    }

    /// Returns the index of the top-scoring choice in `choices`, or `None`
    /// if `choices` is empty. Ties keep the first-seen (lowest-index)
    /// candidate, since the comparison below is strict.
    pub fn best_index(&self, choices: &Domain, state: &SatelliteState, target_values: &TargetValueTable) -> Option<usize> {
        let Sorter::Heuristic(score_fn) = self else {
            return None;
        };
        let mut best: Option<(usize, f64)> = None;
        for (i, cmd) in choices.iter().enumerate() {
            let score = score_fn(cmd, state, target_values);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_shapes::TargetValue;

    #[test]
    fn heuristic_best_index_picks_highest_scoring_raw() {
        let sorter = Sorter::heuristic();
        let state = SatelliteState::new(0.0);
        let targets = TargetValueTable::from_values([
            TargetValue { gp_id: 1, value: 0.2 },
            TargetValue { gp_id: 2, value: 0.8 },
        ]);
        let choices = vec![Command::Raw(vec![1]), Command::Raw(vec![2]), Command::Idl];
        assert_eq!(sorter.best_index(&choices, &state, &targets), Some(1));
    }

    #[test]
    fn random_sorter_has_no_best_index() {
        let sorter = Sorter::Random;
        let state = SatelliteState::new(0.0);
        let targets = TargetValueTable::new();
        let choices = vec![Command::Idl];
        assert_eq!(sorter.best_index(&choices, &state, &targets), None);
    }

    #[test]
    fn best_index_ties_keep_first_seen() {
        let sorter = Sorter::heuristic();
        let state = SatelliteState::new(0.0);
        let targets = TargetValueTable::new();
        let choices = vec![Command::Idl, Command::Gap];
        // Both score 0.0: the first (index 0) must win.
        assert_eq!(sorter.best_index(&choices, &state, &targets), Some(0));
    }
}
