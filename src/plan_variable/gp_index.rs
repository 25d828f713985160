//! Index from ground point to the active variables whose `RAW` choice covers it.

use std::collections::HashMap;

use super::Variable;

/// Maps each ground point to the list of still-active variables whose `RAW`
/// parameter list includes it. Built once from the initial domains and
/// consulted (never rebuilt) whenever a `RAW` is observed during a rollout.
#[derive(Debug, Clone, Default)]
pub struct GpIndex {
    by_gp: HashMap<u32, Vec<Variable>>,
}

impl GpIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, gp: u32, variable: Variable) {
        self.by_gp.entry(gp).or_default().push(variable);
    }

    /// Variables (other than `exclude`) whose initial `RAW` domain covers `gp`.
    pub fn variables_covering(&self, gp: u32, exclude: &Variable) -> impl Iterator<Item = &Variable> {
        self.by_gp
            .get(&gp)
            .into_iter()
            .flatten()
            .filter(move |v| *v != exclude)
    }
}
