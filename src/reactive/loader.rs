use std::{collections::BTreeSet, fs, path::Path};

use anyhow::{Context, Result};

use crate::{
    condition::{Conjunction, Term},
    reactive::{
        error::{RuleError, empty_trigger, invalid_effect, unbound_placeholder},
        types::{ReactiveRule, RuleEffect},
    },
};

pub fn load_rules(path: &Path) -> Result<Vec<ReactiveRule>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read reactive rules {}", path.display()))?;
    let rules: Vec<ReactiveRule> = json5::from_str(&content)
        .with_context(|| format!("failed to parse reactive rules {}", path.display()))?;

    for (index, rule) in rules.iter().enumerate() {
        validate_rule(index, rule)
            .with_context(|| format!("invalid reactive rule in {}", path.display()))?;
    }

    Ok(rules)
}

/// Rejects rules whose effects could never be instantiated: every placeholder
/// used by a belief effect must be bound by the positive clauses of each
/// trigger conjunction.
pub fn validate_rule(index: usize, rule: &ReactiveRule) -> Result<(), RuleError> {
    if rule.trigger.is_empty() {
        return Err(empty_trigger(index));
    }
    if rule.effects.is_empty() {
        return Err(invalid_effect(index, "rule has no effects"));
    }

    for conjunction in &rule.trigger.conjunctions {
        if conjunction.clauses.is_empty() {
            return Err(invalid_effect(index, "trigger contains an empty conjunction"));
        }
        let bound = positively_bound(conjunction);
        for effect in &rule.effects {
            let template = match effect {
                RuleEffect::AddBelief { belief } | RuleEffect::DelBelief { belief } => belief,
                RuleEffect::AddDesire { desire }
                | RuleEffect::BoostDesire { desire }
                | RuleEffect::DelDesire { desire } => {
                    if desire.name.trim().is_empty() {
                        return Err(invalid_effect(index, "desire effect has an empty name"));
                    }
                    continue;
                }
            };
            if let Some(missing) = template.placeholders().find(|name| !bound.contains(*name)) {
                return Err(unbound_placeholder(
                    index,
                    format!(
                        "effect on '{}' uses placeholder '{{{missing}}}' not bound by the trigger",
                        template.name
                    ),
                ));
            }
        }
    }

    Ok(())
}

fn positively_bound(conjunction: &Conjunction) -> BTreeSet<&str> {
    conjunction
        .clauses
        .iter()
        .filter(|clause| !clause.negated)
        .flat_map(|clause| clause.params.iter())
        .filter_map(|term| match term {
            Term::Placeholder(name) => Some(name.as_str()),
            Term::Value(_) => None,
        })
        .collect()
}
