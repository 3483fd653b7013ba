use crate::{
    belief::BeliefStore,
    condition::{Binding, ConditionEvaluator},
    reactive::types::{ReactiveRule, RuleEffect},
    types::OutboundCommand,
};

pub struct ReactiveRuleEngine {
    rules: Vec<ReactiveRule>,
}

impl ReactiveRuleEngine {
    pub fn new(rules: Vec<ReactiveRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ReactiveRule] {
        &self.rules
    }

    /// With no rules there is nothing to watch; the owning loop stops
    /// feeding belief updates to the engine.
    pub fn is_idle(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule against the fresh belief set and returns the
    /// commands of every firing, once per distinct binding. Identical
    /// commands from different bindings are not collapsed.
    #[tracing::instrument(
        name = "reactive_on_belief_update",
        target = "reactive",
        skip_all,
        fields(beliefs = beliefs.len())
    )]
    pub fn on_belief_update(&self, beliefs: &BeliefStore) -> Vec<OutboundCommand> {
        let mut commands = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let bindings = ConditionEvaluator::evaluate(&rule.trigger, beliefs);
            if bindings.is_empty() {
                continue;
            }
            tracing::debug!(
                target: "reactive",
                rule_index = index,
                rule = %rule.name,
                bindings = bindings.len(),
                "rule_triggered"
            );
            for binding in &bindings {
                apply_rule(index, rule, binding, &mut commands);
            }
        }
        commands
    }
}

fn apply_rule(
    rule_index: usize,
    rule: &ReactiveRule,
    binding: &Binding,
    commands: &mut Vec<OutboundCommand>,
) {
    for effect in &rule.effects {
        let command = match effect {
            RuleEffect::AddBelief { belief } => belief
                .instantiate(binding)
                .map(|belief| OutboundCommand::AddBelief { belief }),
            RuleEffect::DelBelief { belief } => belief
                .instantiate(binding)
                .map(|belief| OutboundCommand::DelBelief { belief }),
            RuleEffect::AddDesire { desire } => Some(OutboundCommand::AddDesire {
                desire: desire.substitute(binding),
            }),
            RuleEffect::BoostDesire { desire } => Some(OutboundCommand::BoostDesire {
                desire: desire.substitute(binding),
            }),
            RuleEffect::DelDesire { desire } => Some(OutboundCommand::DelDesire {
                desire: desire.substitute(binding),
            }),
        };

        match command {
            Some(command) => commands.push(command),
            None => tracing::warn!(
                target: "reactive",
                rule_index = rule_index,
                rule = %rule.name,
                "effect_skipped_unbound_placeholder"
            ),
        }
    }
}
