use crate::plan::types::{ActionExecutionInfo, ActionStatus};

/// Re-estimates the plan deadline from observed execution.
///
/// Actions are walked in planned order. Observed start/end times replace the
/// planned ones; an action not yet started keeps its planned offset from its
/// immediate predecessor, so it is shifted by that predecessor's delay. The
/// slack between the planned deadline and the planned makespan is preserved.
pub fn estimate_deadline(
    actions: &[ActionExecutionInfo],
    planned_deadline: f64,
    current_time: f64,
) -> f64 {
    if actions.is_empty() {
        return planned_deadline;
    }

    let planned_makespan = actions
        .iter()
        .map(ActionExecutionInfo::planned_end)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut shift = 0.0;
    let mut makespan = f64::NEG_INFINITY;
    for action in actions {
        let effective_start = action.exec_start.unwrap_or(action.planned_start + shift);
        let effective_end = match (action.exec_end, action.status) {
            (Some(end), _) => end,
            (None, ActionStatus::Running) => (effective_start + action.duration).max(current_time),
            (None, _) => effective_start + action.duration,
        };
        shift = effective_end - action.planned_end();
        makespan = makespan.max(effective_end);
    }

    planned_deadline + (makespan - planned_makespan)
}
