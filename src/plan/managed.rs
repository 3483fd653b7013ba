use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    condition::ConditionDnf,
    desire::Desire,
    plan::{
        codec::format_plan_text,
        deadline::estimate_deadline,
        types::{
            ActionExecutionInfo, ActionKey, ActionStatus, ExecutionFeedback, PlanExecStatus,
            PlanItem,
        },
    },
};

/// Plan items with their commitment flags, as consumed by a re-planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommittedStatus {
    pub queue_index: Option<i32>,
    pub items: Vec<PlanItem>,
}

/// A plan accepted for execution together with its live bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedPlan {
    plan_id: String,
    final_target: Desire,
    plan_target: Desire,
    actions: Vec<ActionExecutionInfo>,
    precondition: ConditionDnf,
    context: ConditionDnf,
    planned_deadline: f64,
    estimated_deadline: f64,
    last_reported_time: f64,
    exec_status: PlanExecStatus,
    library_id: Option<i64>,
    queue_index: Option<i32>,
}

impl ManagedPlan {
    /// Plan whose only target is `target`; precondition and context are
    /// taken from the desire.
    pub fn new(target: Desire, items: Vec<PlanItem>) -> Self {
        let precondition = target.precondition.clone();
        let context = target.context.clone();
        Self::with_targets(target.clone(), target, items, precondition, context)
    }

    pub fn with_targets(
        final_target: Desire,
        plan_target: Desire,
        items: Vec<PlanItem>,
        precondition: ConditionDnf,
        context: ConditionDnf,
    ) -> Self {
        let mut actions: Vec<ActionExecutionInfo> =
            items.iter().map(ActionExecutionInfo::from).collect();
        sort_by_planned_start(&mut actions);

        let planned_deadline = actions
            .iter()
            .map(ActionExecutionInfo::planned_end)
            .fold(0.0, f64::max);

        Self {
            plan_id: Uuid::now_v7().to_string(),
            final_target,
            plan_target,
            actions,
            precondition,
            context,
            planned_deadline,
            estimated_deadline: planned_deadline,
            last_reported_time: 0.0,
            exec_status: PlanExecStatus::Idle,
            library_id: None,
            queue_index: None,
        }
    }

    pub fn with_library_id(mut self, library_id: Option<i64>) -> Self {
        self.library_id = library_id;
        self
    }

    pub fn with_queue_index(mut self, queue_index: Option<i32>) -> Self {
        self.queue_index = queue_index;
        self
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn final_target(&self) -> &Desire {
        &self.final_target
    }

    pub fn plan_target(&self) -> &Desire {
        &self.plan_target
    }

    pub fn actions(&self) -> &[ActionExecutionInfo] {
        &self.actions
    }

    pub fn precondition(&self) -> &ConditionDnf {
        &self.precondition
    }

    pub fn context(&self) -> &ConditionDnf {
        &self.context
    }

    pub fn planned_deadline(&self) -> f64 {
        self.planned_deadline
    }

    pub fn estimated_deadline(&self) -> f64 {
        self.estimated_deadline
    }

    pub fn last_reported_time(&self) -> f64 {
        self.last_reported_time
    }

    pub fn exec_status(&self) -> PlanExecStatus {
        self.exec_status
    }

    pub fn set_exec_status(&mut self, status: PlanExecStatus) {
        self.exec_status = status;
    }

    pub fn library_id(&self) -> Option<i64> {
        self.library_id
    }

    pub fn queue_index(&self) -> Option<i32> {
        self.queue_index
    }

    pub fn items(&self) -> Vec<PlanItem> {
        self.actions.iter().map(ActionExecutionInfo::to_item).collect()
    }

    /// Replaces the action infos with the backend's view. Feedback does not
    /// echo commitment, so each action keeps the `committed` flag of the
    /// action with the same key; actions new to this plan keep the flag the
    /// feedback carries.
    pub fn apply_feedback(&mut self, feedback: &ExecutionFeedback) {
        let committed_by_key: BTreeMap<ActionKey, bool> = self
            .actions
            .iter()
            .map(|action| (action.key(), action.committed))
            .collect();

        let mut actions = feedback.actions.clone();
        for action in &mut actions {
            if let Some(committed) = committed_by_key.get(&action.key()) {
                action.committed = *committed;
            }
        }
        sort_by_planned_start(&mut actions);

        self.actions = actions;
        self.exec_status = feedback.status;
        self.last_reported_time = feedback.current_time;
        self.estimated_deadline =
            estimate_deadline(&self.actions, self.planned_deadline, feedback.current_time);
    }

    pub fn set_committed_all(&mut self, committed: bool) {
        for action in &mut self.actions {
            action.committed = committed;
        }
    }

    /// Marks the action occurrence `(name args…)` planned at `planned_start`.
    /// Returns whether any action matched.
    pub fn set_action_committed(
        &mut self,
        full_name: &str,
        planned_start: f64,
        committed: bool,
    ) -> bool {
        let key = ActionKey::from_full_name(full_name, planned_start);
        let mut matched = false;
        for action in self.actions.iter_mut().filter(|action| action.key() == key) {
            action.committed = committed;
            matched = true;
        }
        matched
    }

    pub fn committed_status(&self) -> CommittedStatus {
        CommittedStatus {
            queue_index: self.queue_index,
            items: self.items(),
        }
    }

    /// Fraction of the plan done, counting running actions by their
    /// reported progress.
    pub fn progress(&self) -> f64 {
        if self.actions.is_empty() {
            return 1.0;
        }
        let done: f64 = self
            .actions
            .iter()
            .map(|action| match action.status {
                ActionStatus::Success => 1.0,
                ActionStatus::Running => f64::from(action.progress.clamp(0.0, 1.0)),
                ActionStatus::Unknown | ActionStatus::Failure => 0.0,
            })
            .sum();
        done / self.actions.len() as f64
    }

    /// Share of actions that reached `success`.
    pub fn success_ratio(&self) -> f64 {
        if self.actions.is_empty() {
            return 1.0;
        }
        self.successful_actions().count() as f64 / self.actions.len() as f64
    }

    pub fn successful_actions(&self) -> impl Iterator<Item = &ActionExecutionInfo> {
        self.actions
            .iter()
            .filter(|action| action.status == ActionStatus::Success)
    }

    /// The not-yet-successful tail of this plan, rebased so that its first
    /// action starts at 0. Commitment flags, targets and conditions carry
    /// over. `None` when everything already succeeded.
    pub fn remaining(&self) -> Option<ManagedPlan> {
        let pending: Vec<&ActionExecutionInfo> = self
            .actions
            .iter()
            .filter(|action| action.status != ActionStatus::Success)
            .collect();
        let offset = pending
            .iter()
            .map(|action| action.planned_start)
            .fold(f64::INFINITY, f64::min);
        if !offset.is_finite() {
            return None;
        }

        let items = pending
            .into_iter()
            .map(|action| PlanItem {
                planned_start: action.planned_start - offset,
                ..action.to_item()
            })
            .collect();
        let mut resumed = ManagedPlan::with_targets(
            self.final_target.clone(),
            self.plan_target.clone(),
            items,
            self.precondition.clone(),
            self.context.clone(),
        )
        .with_library_id(self.library_id)
        .with_queue_index(self.queue_index);
        resumed.plan_id = self.plan_id.clone();
        Some(resumed)
    }

    pub fn to_plan_text(&self) -> String {
        format_plan_text(&self.items())
    }
}

fn sort_by_planned_start(actions: &mut [ActionExecutionInfo]) {
    actions.sort_by(|lhs, rhs| lhs.planned_start.total_cmp(&rhs.planned_start));
}
