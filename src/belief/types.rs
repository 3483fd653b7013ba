use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BeliefKind {
    #[default]
    Predicate,
    Fluent,
}

/// A fact held about the world. Predicates are true by presence; fluents
/// additionally carry a numeric value under the same identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub name: String,
    #[serde(default)]
    pub kind: BeliefKind,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub value: f64,
}

impl Belief {
    pub fn predicate(name: impl Into<String>, params: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: BeliefKind::Predicate,
            params: params.iter().map(|param| (*param).to_string()).collect(),
            value: 0.0,
        }
    }

    pub fn fluent(name: impl Into<String>, params: &[&str], value: f64) -> Self {
        Self {
            name: name.into(),
            kind: BeliefKind::Fluent,
            params: params.iter().map(|param| (*param).to_string()).collect(),
            value,
        }
    }

    pub fn key(&self) -> BeliefKey {
        BeliefKey {
            name: self.name.clone(),
            params: self.params.clone(),
        }
    }

    pub fn is_fluent(&self) -> bool {
        matches!(self.kind, BeliefKind::Fluent)
    }
}

impl fmt::Display for Belief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.name)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        write!(f, ")")?;
        if self.is_fluent() {
            write!(f, "={}", self.value)?;
        }
        Ok(())
    }
}

/// Identity of a belief inside a store: name first so that all facts sharing
/// a name are contiguous in key order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BeliefKey {
    pub name: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BeliefUpdate {
    Add { belief: Belief },
    Remove { belief: Belief },
    ReplaceAll { beliefs: Vec<Belief> },
}
