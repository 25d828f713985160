//! The search tree: a dense arena of [`Node`]s addressed by [`NodeId`], plus
//! the rank-normalized UCB child-selection rule (SPEC_FULL §4.3).

use std::collections::VecDeque;

use crate::plan_variable::{Command, Domain, Variable};

/// Index into a [`Tree`]'s arena. 1-indexed per SPEC_FULL's Design Notes;
/// index 0 is never allocated so `NodeId(0)` can serve as a niche-free
/// "no parent" sentinel if ever needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A node's progress through expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Just created; `unexplored_choices` not yet populated.
    Init,
    /// `unexplored_choices` populated and non-empty: still a leaf for
    /// select-descent purposes.
    Open,
    /// Every choice has been expanded into a child; select must descend
    /// further via [`best_child`].
    Exhausted,
}

/// One node of the search tree. The root has `parent = None`, `variable =
/// None`, and `prior_move = None`; every other node records the command that
/// was chosen to reach it from its parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub variable: Option<Variable>,
    pub prior_move: Option<Command>,
    pub visit_count: u64,
    pub total_reward: f64,
    pub status: NodeStatus,
    pub unexplored_choices: Domain,
    pub depth: u32,
    /// True once every descendant path has been fully exhausted: the whole
    /// subtree rooted here offers nothing new. Recomputed bottom-up only when
    /// a node newly becomes `Exhausted`, so detecting whole-tree exhaustion
    /// never requires a full-tree scan.
    pub terminal: bool,
}

impl Node {
    fn root() -> Self {
        Self {
            id: NodeId(1),
            parent: None,
            children: Vec::new(),
            variable: None,
            prior_move: None,
            visit_count: 0,
            total_reward: 0.0,
            status: NodeStatus::Init,
            unexplored_choices: Vec::new(),
            depth: 0,
            terminal: false,
        }
    }

    pub fn avg_reward(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_reward / self.visit_count as f64
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.status != NodeStatus::Exhausted
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Dense, 1-indexed node arena. `NodeId(1)` is always the root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self { nodes: vec![Node::root()] }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(1)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 - 1]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 - 1]
    }

    /// Creates a new child of `parent`, reached by `prior_move` on
    /// `variable`, and registers it in the parent's `children` list.
    pub fn create_child(&mut self, parent: NodeId, variable: Variable, prior_move: Command) -> NodeId {
        let depth = self.get(parent).depth + 1;
        let id = NodeId(self.nodes.len() + 1);
        self.nodes.push(Node {
            id,
            parent: Some(parent),
            children: Vec::new(),
            variable: Some(variable),
            prior_move: Some(prior_move),
            visit_count: 0,
            total_reward: 0.0,
            status: NodeStatus::Init,
            unexplored_choices: Vec::new(),
            depth,
            terminal: false,
        });
        self.get_mut(parent).children.push(id);
        id
    }

    /// Path of `prior_move`s from the root to `leaf`, in descend order
    /// (root's child first). The root itself contributes nothing since it
    /// has no `prior_move`.
    pub fn path_to(&self, leaf: NodeId) -> VecDeque<Command> {
        let mut moves = VecDeque::new();
        let mut current = leaf;
        loop {
            let node = self.get(current);
            if let Some(mv) = &node.prior_move {
                moves.push_front(mv.clone());
            }
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        moves
    }

    /// Backpropagates `score` from `leaf` up to the root: every ancestor
    /// (inclusive) gains one visit and `score` added to `total_reward`. The
    /// same unrounded score is added at every level (SPEC_FULL §9); only
    /// presentation rounds.
    pub fn backpropagate(&mut self, leaf: NodeId, score: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visit_count += 1;
            node.total_reward += score;
            current = node.parent;
        }
    }

    /// Recomputes `terminal` bottom-up from `from`, called only when a node
    /// newly transitions to `Exhausted`. A node is terminal if it is
    /// `Exhausted` and every child is terminal (or it is `Exhausted` with no
    /// children, i.e. a fully-played-out leaf).
    pub fn recompute_terminal_from(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.get(id);
            let newly_terminal = node.status == NodeStatus::Exhausted
                && node.children.iter().all(|c| self.get(*c).terminal);
            if self.get(id).terminal == newly_terminal {
                break;
            }
            self.get_mut(id).terminal = newly_terminal;
            current = self.get(id).parent;
        }
    }

    pub fn is_fully_exhausted(&self) -> bool {
        self.get(self.root_id()).terminal
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Rank-normalized UCB child selection (SPEC_FULL §4.3): children are sorted
/// ascending by `avg_reward` and assigned ranks `1..=K`; each rank is
/// normalized by `rank_sum = K*(K+1)/2`. Combined with the exploration term
/// `sqrt(2) * sqrt(2*ln(max(1, parent_visits)) / max(1, child_visits))`. Ties
/// are broken by insertion order: the first child (in `node.children`'s
/// original order) strictly greater than all others seen so far wins.
pub fn best_child(tree: &Tree, node_id: NodeId) -> Option<NodeId> {
    let node = tree.get(node_id);
    if node.children.is_empty() {
        return None;
    }
    let k = node.children.len();

    let mut by_reward: Vec<NodeId> = node.children.clone();
    by_reward.sort_by(|a, b| tree.get(*a).avg_reward().partial_cmp(&tree.get(*b).avg_reward()).unwrap());

    let rank_sum = (k * (k + 1) / 2) as f64;
    let mut rank_of = std::collections::HashMap::with_capacity(k);
    for (i, child) in by_reward.iter().enumerate() {
        rank_of.insert(*child, (i + 1) as f64);
    }

    let parent_visits = node.visit_count;
    let mut best: Option<(NodeId, f64)> = None;
    for &child in &node.children {
        let child_node = tree.get(child);
        let normalized_rank = rank_of[&child] / rank_sum;
        let exploration = (2.0_f64).sqrt()
            * ((2.0 * (parent_visits.max(1) as f64).ln()) / (child_node.visit_count.max(1) as f64)).sqrt();
        let score = normalized_rank + exploration;
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((child, score)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(sec: i64) -> Variable {
        Variable::new("S1", sec)
    }

    #[test]
    fn root_has_no_parent_or_prior_move() {
        let tree = Tree::new();
        let root = tree.get(tree.root_id());
        assert!(root.parent.is_none());
        assert!(root.prior_move.is_none());
        assert_eq!(root.depth, 0);
    }

    #[test]
    fn create_child_registers_in_parent_and_increments_depth() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let child = tree.create_child(root, var(1), Command::Idl);
        assert_eq!(tree.get(root).children, vec![child]);
        assert_eq!(tree.get(child).depth, 1);
        assert_eq!(tree.get(child).parent, Some(root));
    }

    #[test]
    fn path_to_collects_prior_moves_in_descend_order() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let a = tree.create_child(root, var(1), Command::Raw(vec![1]));
        let b = tree.create_child(a, var(2), Command::Dnl("G1".into()));
        let path = tree.path_to(b);
        assert_eq!(path, VecDeque::from([Command::Raw(vec![1]), Command::Dnl("G1".into())]));
    }

    #[test]
    fn backpropagate_updates_every_ancestor_with_same_score() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let a = tree.create_child(root, var(1), Command::Idl);
        let b = tree.create_child(a, var(2), Command::Idl);
        tree.backpropagate(b, 4.0);
        assert_eq!(tree.get(b).visit_count, 1);
        assert_eq!(tree.get(a).visit_count, 1);
        assert_eq!(tree.get(root).visit_count, 1);
        assert_eq!(tree.get(b).total_reward, 4.0);
        assert_eq!(tree.get(a).total_reward, 4.0);
        assert_eq!(tree.get(root).total_reward, 4.0);
    }

    #[test]
    fn best_child_prefers_higher_avg_reward_when_visits_equal() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let low = tree.create_child(root, var(1), Command::Idl);
        let high = tree.create_child(root, var(1), Command::Gap);
        tree.get_mut(root).visit_count = 10;
        tree.get_mut(low).visit_count = 5;
        tree.get_mut(low).total_reward = 1.0;
        tree.get_mut(high).visit_count = 5;
        tree.get_mut(high).total_reward = 9.0;
        assert_eq!(best_child(&tree, root), Some(high));
    }

    #[test]
    fn best_child_equal_avg_reward_breaks_via_stable_rank_order() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let a = tree.create_child(root, var(1), Command::Idl);
        let b = tree.create_child(root, var(1), Command::Gap);
        tree.get_mut(root).visit_count = 2;
        tree.get_mut(a).visit_count = 1;
        tree.get_mut(b).visit_count = 1;
        // Equal avg_reward (0.0) and equal visit counts: the stable sort
        // underlying rank assignment preserves insertion order, so the
        // later child receives the higher rank and wins.
        assert_eq!(best_child(&tree, root), Some(b));
    }

    #[test]
    fn best_child_none_for_childless_node() {
        let tree = Tree::new();
        assert_eq!(best_child(&tree, tree.root_id()), None);
    }

    #[test]
    fn recompute_terminal_propagates_once_all_children_terminal() {
        let mut tree = Tree::new();
        let root = tree.root_id();
        let a = tree.create_child(root, var(1), Command::Idl);
        tree.get_mut(a).status = NodeStatus::Exhausted;
        tree.get_mut(root).status = NodeStatus::Exhausted;
        // `a` has no children: exhausted-with-no-children counts as terminal.
        tree.recompute_terminal_from(a);
        assert!(tree.get(a).terminal);
        assert!(tree.get(root).terminal);
        assert!(tree.is_fully_exhausted());
    }
}
