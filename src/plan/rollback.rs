use std::collections::BTreeMap;

use crate::{
    domain::{ActionDefinition, ActionEffect},
    plan::{
        managed::ManagedPlan,
        types::{ActionExecutionInfo, ActionStatus},
    },
    types::OutboundCommand,
};

/// Compensating belief mutations for an aborted plan.
///
/// Only actions that reached `success` are compensated, latest completion
/// first, each effect inverted in reverse declaration order. Compensation is
/// derived from the declared effects, not from observed backend state.
/// Fluent effects carry no prior value to restore and are skipped.
pub fn compute_rollback(
    plan: &ManagedPlan,
    definitions: &BTreeMap<String, ActionDefinition>,
) -> Vec<OutboundCommand> {
    rollback_actions(plan.actions(), definitions)
}

/// Same as [`compute_rollback`] over a bare list of action infos, e.g. the
/// actions a plan completed before it was paused and resumed.
pub fn rollback_actions<'a>(
    actions: impl IntoIterator<Item = &'a ActionExecutionInfo>,
    definitions: &BTreeMap<String, ActionDefinition>,
) -> Vec<OutboundCommand> {
    let mut completed: Vec<&ActionExecutionInfo> = actions
        .into_iter()
        .filter(|action| action.status == ActionStatus::Success)
        .collect();
    completed.sort_by(|lhs, rhs| completion_time(rhs).total_cmp(&completion_time(lhs)));

    let mut commands = Vec::new();
    for action in completed {
        let Some(definition) = definitions.get(&action.name) else {
            tracing::warn!(
                target: "director",
                action = %action.full_name(),
                "rollback_missing_action_definition"
            );
            continue;
        };
        let Some(binding) = definition.bind_args(&action.args) else {
            tracing::warn!(
                target: "director",
                action = %action.full_name(),
                expected = definition.parameters.len(),
                "rollback_arity_mismatch"
            );
            continue;
        };

        for effect in definition.effects.iter().rev() {
            let command = match effect {
                ActionEffect::Add { belief } => belief
                    .instantiate(&binding)
                    .filter(|belief| !belief.is_fluent())
                    .map(|belief| OutboundCommand::DelBelief { belief }),
                ActionEffect::Del { belief } => belief
                    .instantiate(&binding)
                    .filter(|belief| !belief.is_fluent())
                    .map(|belief| OutboundCommand::AddBelief { belief }),
            };
            commands.extend(command);
        }
    }
    commands
}

fn completion_time(action: &ActionExecutionInfo) -> f64 {
    action.exec_end.unwrap_or(action.planned_end())
}
