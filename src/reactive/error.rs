use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleErrorKind {
    EmptyTrigger,
    UnboundPlaceholder,
    InvalidEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleError {
    pub kind: RuleErrorKind,
    pub rule_index: usize,
    pub message: String,
}

impl RuleError {
    pub fn new(kind: RuleErrorKind, rule_index: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            rule_index,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{}: {}", self.rule_index, self.message)
    }
}

impl std::error::Error for RuleError {}

pub fn empty_trigger(rule_index: usize) -> RuleError {
    RuleError::new(
        RuleErrorKind::EmptyTrigger,
        rule_index,
        "trigger condition has no conjunctions",
    )
}

pub fn unbound_placeholder(rule_index: usize, message: impl Into<String>) -> RuleError {
    RuleError::new(RuleErrorKind::UnboundPlaceholder, rule_index, message)
}

pub fn invalid_effect(rule_index: usize, message: impl Into<String>) -> RuleError {
    RuleError::new(RuleErrorKind::InvalidEffect, rule_index, message)
}
