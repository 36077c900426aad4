use crate::terms::Bindings;
use std::collections::HashMap;

/// The identifier of an environment stored in an [`EnvMap`].
pub type EnvId = usize;

/// The identifier of the empty environment, from which every match attempt starts.
pub const EMPTY_ENV: EnvId = 0;

/// The outcome of matching a head against a candidate constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The candidate could not be matched.
    NoMatch,
    /// The candidate was matched, producing the given environment.
    Matched(EnvId),
}

/// The memo of the head matching algorithm.
///
/// For each rule, head index and parent environment, the memo records the outcome of each candidate scanned so far,
/// in the order of the candidate list of the constraint store.
/// Since candidate lists only grow at their end, the next match attempt can resume the scan after the last recorded slot.
pub struct EnvMap {
    envs: Vec<Bindings>,
    slots: HashMap<(usize, usize, EnvId), Vec<Slot>>,
}

impl Default for EnvMap {
    fn default() -> Self {
        EnvMap {
            envs: vec![Bindings::default()],
            slots: HashMap::new(),
        }
    }
}

impl EnvMap {
    /// Stores an environment and returns its identifier.
    pub fn add_env(&mut self, env: Bindings) -> EnvId {
        self.envs.push(env);
        self.envs.len() - 1
    }

    /// Returns the environment with the given identifier.
    pub fn env(&self, id: EnvId) -> &Bindings {
        &self.envs[id]
    }

    /// Returns the slots recorded for a head under a parent environment.
    pub fn slots(&self, rule: usize, head: usize, parent: EnvId) -> &[Slot] {
        self.slots
            .get(&(rule, head, parent))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Records the outcome of the next candidate of a head under a parent environment.
    pub fn push_slot(&mut self, rule: usize, head: usize, parent: EnvId, slot: Slot) {
        self.slots.entry((rule, head, parent)).or_default().push(slot);
    }

    /// Returns the number of stored environments, the empty one included.
    pub fn n_envs(&self) -> usize {
        self.envs.len()
    }
}
