//! The MCTS engine: an `select -> replay -> expand -> simulate ->
//! backpropagate` state machine driven by repeated [`ChoicePolicy::choose_value`]
//! calls, cascading through multiple stages within a single call when the
//! current stage has nothing left to contribute (SPEC_FULL §4.3).
//!
//! The arena lives behind an `Arc<Mutex<Tree>>` even in the common
//! independent-tree case (each `Engine` simply owns the only handle to its
//! own lock). This lets the same type serve the optional shared-tree mode
//! (SPEC_FULL §4.5, §9 Open Question 7) by constructing several engines
//! around clones of one handle instead: [`Engine::new_shared`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::io_shapes::TargetValueTable;
use crate::mcts::node::{best_child, NodeId, NodeStatus, Tree};
use crate::mcts::sorter::Sorter;
use crate::plan_variable::{Command, Domain, Variable};
use crate::satellite_state::SatelliteState;
use crate::simulator::ChoicePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Select,
    Replay,
    Expand,
    Simulate,
}

/// One worker's search state: a handle to a tree plus the stage machine
/// driving a single rollout's decisions. A fresh `Engine` starts empty; call
/// [`Engine::begin_rollout`] before each rollout and [`Engine::finish_rollout`]
/// after, passing it as the [`ChoicePolicy`] to a [`crate::simulator::RolloutSimulator`]
/// in between.
pub struct Engine {
    tree: Arc<Mutex<Tree>>,
    stage: Stage,
    current_node: NodeId,
    replay_plan: VecDeque<Command>,
    sorter: Sorter,
    random_choice_pct: u32,
    rng: StdRng,
    best_score: f64,
}

impl Engine {
    /// Independent-tree mode: this engine owns the only handle to its arena.
    pub fn new(sorter: Sorter, random_choice_pct: u32, rng_seed: Option<u64>) -> Self {
        Self::with_tree(sorter, random_choice_pct, rng_seed, Arc::new(Mutex::new(Tree::new())))
    }

    /// Shared-tree mode (SPEC_FULL §4.5): several engines search the same
    /// arena behind one lock, root-parallel style. Build one handle with
    /// [`Engine::new`] then pass [`Engine::shared_tree_handle`] clones to the
    /// rest of the pool's engines via this constructor. Off by default;
    /// nothing in `worker_pool` opts into it unless asked to.
    pub fn new_shared(sorter: Sorter, random_choice_pct: u32, rng_seed: Option<u64>, tree: Arc<Mutex<Tree>>) -> Self {
        Self::with_tree(sorter, random_choice_pct, rng_seed, tree)
    }

    fn with_tree(sorter: Sorter, random_choice_pct: u32, rng_seed: Option<u64>, tree: Arc<Mutex<Tree>>) -> Self {
        let root = tree.lock().expect("tree lock poisoned").root_id();
        Self {
            tree,
            stage: Stage::Select,
            current_node: root,
            replay_plan: VecDeque::new(),
            sorter,
            random_choice_pct,
            rng: rng_seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy),
            best_score: f64::MIN,
        }
    }

    /// A clone of this engine's tree handle, for building sibling engines in
    /// shared-tree mode.
    pub fn shared_tree_handle(&self) -> Arc<Mutex<Tree>> {
        Arc::clone(&self.tree)
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn is_exhausted(&self) -> bool {
        self.tree.lock().expect("tree lock poisoned").is_fully_exhausted()
    }

    pub fn root_visit_count(&self) -> u64 {
        let tree = self.tree.lock().expect("tree lock poisoned");
        tree.get(tree.root_id()).visit_count
    }

    /// Runs `f` against the locked tree. Exposed for tests and callers that
    /// need to inspect the arena directly; production code drives the engine
    /// purely through [`ChoicePolicy::choose_value`].
    pub fn with_tree<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        f(&self.tree.lock().expect("tree lock poisoned"))
    }

    /// Resets the stage machine for a new rollout. The tree itself persists
    /// across rollouts; only the per-rollout cursor is reset.
    pub fn begin_rollout(&mut self) {
        self.stage = Stage::Select;
        self.current_node = self.tree.lock().expect("tree lock poisoned").root_id();
        self.replay_plan.clear();
    }

    /// Backpropagates `score` from the rollout's expanded leaf up to the
    /// root, and recomputes the subtree's exhaustion flag if that leaf's
    /// ancestor just became `Exhausted` during expansion.
    pub fn finish_rollout(&mut self, score: f64) {
        self.tree.lock().expect("tree lock poisoned").backpropagate(self.current_node, score);
        self.best_score = self.best_score.max(score);
    }

    fn pick_uniform(&mut self, choices: &Domain) -> Command {
        let idx = self.rng.gen_range(0..choices.len());
        choices[idx].clone()
    }

    /// Simulate-stage pick: a `Heuristic` sorter rolls `[0, 100)` against
    /// `random_choice_pct` to decide whether to explore uniformly or exploit
    /// the top-scoring choice; a `Random` sorter always picks uniformly
    /// regardless of the knob (SPEC_FULL §4.3).
    fn pick_simulate_choice(&mut self, choices: &Domain, state: &SatelliteState, target_values: &TargetValueTable) -> Command {
        match self.sorter {
            Sorter::Random => self.pick_uniform(choices),
            Sorter::Heuristic(_) => {
                let roll = self.rng.gen_range(0..100u32);
                if roll < self.random_choice_pct {
                    self.pick_uniform(choices)
                } else {
                    let idx = self.sorter.best_index(choices, state, target_values).unwrap_or(0);
                    choices[idx].clone()
                }
            }
        }
    }
}

/// Descends from the root through fully-`Exhausted` nodes via rank-normalized
/// UCB until it reaches a leaf. Read-only; callers hold the tree's lock for
/// the duration.
fn select_leaf(tree: &Tree) -> NodeId {
    let mut node_id = tree.root_id();
    while tree.get(node_id).has_children() && tree.get(node_id).status == NodeStatus::Exhausted {
        node_id = best_child(tree, node_id).expect("an exhausted node always has at least one child");
    }
    node_id
}

fn pick_expand_index(tree: &Tree, node_id: NodeId, sorter: Sorter, rng: &mut StdRng, state: &SatelliteState, target_values: &TargetValueTable) -> usize {
    let len = tree.get(node_id).unexplored_choices.len();
    match sorter {
        Sorter::Random => rng.gen_range(0..len),
        Sorter::Heuristic(_) => {
            let unexplored = &tree.get(node_id).unexplored_choices;
            sorter.best_index(unexplored, state, target_values).unwrap_or(0)
        }
    }
}

/// Expands exactly one new child of `node_id`: on first visit to this node,
/// captures `choices` as its `unexplored_choices` (later revisits reuse that
/// stored set rather than whatever the caller passes in, so a node's menu of
/// moves never drifts across rollouts). Callers hold the tree's lock for the
/// duration, so this and the preceding [`select_leaf`] compose into one
/// critical section when select falls straight through to expand with no
/// intervening replay (SPEC_FULL §4.5).
fn expand_leaf(
    tree: &mut Tree,
    node_id: NodeId,
    sorter: Sorter,
    rng: &mut StdRng,
    variable: &Variable,
    choices: &Domain,
    state: &SatelliteState,
    target_values: &TargetValueTable,
) -> (NodeId, Command) {
    if tree.get(node_id).status == NodeStatus::Init {
        let node = tree.get_mut(node_id);
        node.unexplored_choices = choices.clone();
        node.status = NodeStatus::Open;
    }

    let idx = pick_expand_index(tree, node_id, sorter, rng, state, target_values);
    let cmd = tree.get_mut(node_id).unexplored_choices.remove(idx);
    let exhausted_now = tree.get(node_id).unexplored_choices.is_empty();
    if exhausted_now {
        tree.get_mut(node_id).status = NodeStatus::Exhausted;
    }

    let child = tree.create_child(node_id, variable.clone(), cmd.clone());
    if exhausted_now {
        tree.recompute_terminal_from(node_id);
    }

    (child, cmd)
}

impl ChoicePolicy for Engine {
    fn choose_value(
        &mut self,
        variable: &Variable,
        choices: &Domain,
        state: &SatelliteState,
        target_values: &TargetValueTable,
    ) -> Command {
        loop {
            match self.stage {
                Stage::Select => {
                    let mut tree = self.tree.lock().expect("tree lock poisoned");
                    let leaf = select_leaf(&tree);
                    self.current_node = leaf;
                    self.replay_plan = tree.path_to(leaf);

                    if self.replay_plan.is_empty() {
                        let (child, cmd) = expand_leaf(&mut tree, leaf, self.sorter, &mut self.rng, variable, choices, state, target_values);
                        drop(tree);
                        self.current_node = child;
                        self.stage = Stage::Simulate;
                        return cmd;
                    }
                    drop(tree);
                    self.stage = Stage::Replay;
                }
                Stage::Replay => match self.replay_plan.pop_front() {
                    Some(mv) => return mv,
                    None => self.stage = Stage::Expand,
                },
                Stage::Expand => {
                    let mut tree = self.tree.lock().expect("tree lock poisoned");
                    let (child, cmd) = expand_leaf(&mut tree, self.current_node, self.sorter, &mut self.rng, variable, choices, state, target_values);
                    drop(tree);
                    self.current_node = child;
                    self.stage = Stage::Simulate;
                    return cmd;
                }
                Stage::Simulate => return self.pick_simulate_choice(choices, state, target_values),
            }
        }
    }
}
