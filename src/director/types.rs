use serde::{Deserialize, Serialize};

use crate::{
    condition::ConditionDnf,
    desire::Desire,
    director::error::{DirectorError, DirectorErrorKind, rejected_request},
    plan::{ActionExecutionInfo, ManagedPlan, PlanExecStatus, PlanItem, parse_plan_text},
    types::OutboundCommand,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorState {
    Starting,
    Ready,
    Executing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRequestKind {
    Execute,
    Abort,
}

/// Plan handed over for execution. Actions come either as structured
/// `items` or as executor `plan_text`; precondition and context default to
/// the final target's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBody {
    pub final_target: Desire,
    #[serde(default)]
    pub plan_target: Option<Desire>,
    #[serde(default)]
    pub items: Vec<PlanItem>,
    #[serde(default)]
    pub plan_text: Option<String>,
    #[serde(default)]
    pub precondition: Option<ConditionDnf>,
    #[serde(default)]
    pub context: Option<ConditionDnf>,
    #[serde(default)]
    pub library_id: Option<i64>,
    #[serde(default)]
    pub queue_index: Option<i32>,
}

impl PlanBody {
    pub fn new(final_target: Desire, items: Vec<PlanItem>) -> Self {
        Self {
            final_target,
            plan_target: None,
            items,
            plan_text: None,
            precondition: None,
            context: None,
            library_id: None,
            queue_index: None,
        }
    }

    pub fn with_context(mut self, context: ConditionDnf) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_precondition(mut self, precondition: ConditionDnf) -> Self {
        self.precondition = Some(precondition);
        self
    }

    pub(crate) fn resolve_items(&self) -> Result<Vec<PlanItem>, DirectorError> {
        match &self.plan_text {
            Some(_) if !self.items.is_empty() => Err(rejected_request(
                "plan carries both items and plan_text",
            )),
            Some(text) => parse_plan_text(text)
                .map_err(|err| rejected_request(format!("malformed plan text: {err}"))),
            None => Ok(self.items.clone()),
        }
    }

    pub(crate) fn into_plan(self, items: Vec<PlanItem>) -> ManagedPlan {
        let plan_target = self
            .plan_target
            .unwrap_or_else(|| self.final_target.clone());
        let precondition = self
            .precondition
            .unwrap_or_else(|| self.final_target.precondition.clone());
        let context = self
            .context
            .unwrap_or_else(|| self.final_target.context.clone());
        ManagedPlan::with_targets(self.final_target, plan_target, items, precondition, context)
            .with_library_id(self.library_id)
            .with_queue_index(self.queue_index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub kind: PlanRequestKind,
    #[serde(default)]
    pub body: Option<PlanBody>,
}

impl PlanRequest {
    pub fn execute(body: PlanBody) -> Self {
        Self {
            kind: PlanRequestKind::Execute,
            body: Some(body),
        }
    }

    pub fn abort() -> Self {
        Self {
            kind: PlanRequestKind::Abort,
            body: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<DirectorErrorKind>,
}

impl PlanResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
            error_kind: None,
        }
    }

    pub fn rejected(err: &DirectorError) -> Self {
        Self {
            accepted: false,
            reason: Some(err.message.clone()),
            error_kind: Some(err.kind),
        }
    }
}

/// Status feed entry for the plan in execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStatusReport {
    pub plan_id: String,
    pub target: String,
    pub status: PlanExecStatus,
    pub current_time: f64,
    pub estimated_deadline: f64,
    pub actions: Vec<ActionExecutionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PlanStatusReport {
    pub fn from_plan(plan: &ManagedPlan, reason: Option<String>) -> Self {
        Self {
            plan_id: plan.plan_id().to_string(),
            target: plan.plan_target().name.clone(),
            status: plan.exec_status(),
            current_time: plan.last_reported_time(),
            estimated_deadline: plan.estimated_deadline(),
            actions: plan.actions().to_vec(),
            reason,
        }
    }
}

/// How a plan left the director.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan_id: String,
    pub status: PlanExecStatus,
    pub cause: Option<DirectorErrorKind>,
    pub rollback: Vec<OutboundCommand>,
}
