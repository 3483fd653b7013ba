use serde::{Deserialize, Serialize};

use crate::{
    belief::BeliefKind,
    condition::{Binding, ConditionDnf, Term},
};

/// Distinguishes the goal ultimately pursued from a stepping-stone target
/// that a partial plan is meant to reach.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DesireRole {
    #[default]
    Final,
    Intermediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desire {
    pub name: String,
    #[serde(default)]
    pub role: DesireRole,
    pub target: ConditionDnf,
    #[serde(default)]
    pub priority: f32,
    /// Seconds the desire is expected to take to fulfil.
    #[serde(default)]
    pub deadline: f32,
    #[serde(default)]
    pub precondition: ConditionDnf,
    #[serde(default)]
    pub context: ConditionDnf,
}

impl Desire {
    pub fn new(name: impl Into<String>, target: ConditionDnf) -> Self {
        Self {
            name: name.into(),
            role: DesireRole::Final,
            target,
            priority: 0.0,
            deadline: 0.0,
            precondition: ConditionDnf::default(),
            context: ConditionDnf::default(),
        }
    }

    pub fn same_identity(&self, other: &Desire) -> bool {
        self.name == other.name && self.role == other.role
    }

    pub fn substitute(&self, binding: &Binding) -> Desire {
        Desire {
            target: self.target.substitute(binding),
            precondition: self.precondition.substitute(binding),
            context: self.context.substitute(binding),
            ..self.clone()
        }
    }

    /// PDDL goal for the first conjunction of the target, keeping only
    /// positive ground predicate clauses, e.g. `(and (in r1 kitchen))`.
    pub fn to_pddl_goal(&self) -> String {
        let mut goal = String::from("(and");
        if let Some(conjunction) = self.target.conjunctions.first() {
            for clause in &conjunction.clauses {
                if clause.negated
                    || clause.kind != BeliefKind::Predicate
                    || !clause.is_ground()
                {
                    continue;
                }
                goal.push_str(" (");
                goal.push_str(&clause.name);
                for term in &clause.params {
                    if let Term::Value(value) = term {
                        goal.push(' ');
                        goal.push_str(value);
                    }
                }
                goal.push(')');
            }
        }
        goal.push(')');
        goal
    }
}
