use serde::{Deserialize, Serialize};

use crate::{
    condition::{BeliefTemplate, ConditionDnf},
    desire::Desire,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleEffect {
    AddBelief { belief: BeliefTemplate },
    DelBelief { belief: BeliefTemplate },
    AddDesire { desire: Desire },
    BoostDesire { desire: Desire },
    DelDesire { desire: Desire },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveRule {
    #[serde(default)]
    pub name: String,
    pub trigger: ConditionDnf,
    pub effects: Vec<RuleEffect>,
}
