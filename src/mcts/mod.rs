//! The Monte Carlo Tree Search engine (SPEC_FULL §4.3): an arena-based
//! search tree, rank-normalized UCB child selection, and the
//! select/replay/expand/simulate stage machine that implements
//! [`crate::simulator::ChoicePolicy`] for one worker's rollouts.

mod engine;
mod node;
mod sorter;

pub use engine::Engine;
pub use node::{best_child, Node, NodeId, NodeStatus, Tree};
pub use sorter::Sorter;
