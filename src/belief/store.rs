use std::collections::BTreeMap;

use crate::belief::types::{Belief, BeliefKey, BeliefUpdate};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeliefStore {
    beliefs: BTreeMap<BeliefKey, Belief>,
}

impl BeliefStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_beliefs(beliefs: impl IntoIterator<Item = Belief>) -> Self {
        let mut store = Self::new();
        for belief in beliefs {
            store.add(belief);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Inserts the belief, replacing the value of an existing fluent with the
    /// same identity. Returns whether the store changed.
    pub fn add(&mut self, belief: Belief) -> bool {
        let key = belief.key();
        match self.beliefs.get_mut(&key) {
            Some(existing) if *existing == belief => false,
            Some(existing) => {
                *existing = belief;
                true
            }
            None => {
                self.beliefs.insert(key, belief);
                true
            }
        }
    }

    pub fn remove(&mut self, belief: &Belief) -> bool {
        self.beliefs.remove(&belief.key()).is_some()
    }

    pub fn contains(&self, key: &BeliefKey) -> bool {
        self.beliefs.contains_key(key)
    }

    pub fn get(&self, key: &BeliefKey) -> Option<&Belief> {
        self.beliefs.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Belief> {
        self.beliefs.values()
    }

    /// All beliefs sharing `name`, in parameter order.
    pub fn with_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Belief> + 'a {
        let start = BeliefKey {
            name: name.to_string(),
            params: Vec::new(),
        };
        self.beliefs
            .range(start..)
            .take_while(move |(key, _)| key.name == name)
            .map(|(_, belief)| belief)
    }

    pub fn apply(&mut self, update: BeliefUpdate) -> bool {
        match update {
            BeliefUpdate::Add { belief } => self.add(belief),
            BeliefUpdate::Remove { belief } => self.remove(&belief),
            BeliefUpdate::ReplaceAll { beliefs } => {
                let replacement = Self::from_beliefs(beliefs);
                if replacement == *self {
                    return false;
                }
                *self = replacement;
                true
            }
        }
    }
}
