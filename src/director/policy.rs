use serde::{Deserialize, Serialize};

use crate::{
    config::DirectorConfig,
    director::error::{DirectorError, DirectorErrorKind},
    plan::ManagedPlan,
};

/// What a competing EXECUTE does to the plan already executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReschedulePolicy {
    /// Reject the competing request.
    #[default]
    NoPreempt,
    /// Abort the current plan with rollback, then start the new one.
    Preempt,
    /// Pause the current plan, run the new one, then resume what is left.
    PreemptRetain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlmostCompleteMode {
    #[default]
    Abort,
    LetFinish,
}

/// Decides whether a pending abort of a nearly finished plan is dropped in
/// favour of letting the plan run to its end. Only consulted for explicit
/// aborts and context violations. "Nearly finished" is measured by
/// [`ManagedPlan::progress`], which credits running actions partially.
pub trait AlmostCompletePolicy: Send + Sync {
    fn let_finish(&self, plan: &ManagedPlan, cause: &DirectorError) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAbort;

impl AlmostCompletePolicy for AlwaysAbort {
    fn let_finish(&self, _plan: &ManagedPlan, _cause: &DirectorError) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LetFinishWhenAlmostComplete {
    threshold: f64,
}

impl LetFinishWhenAlmostComplete {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl AlmostCompletePolicy for LetFinishWhenAlmostComplete {
    fn let_finish(&self, plan: &ManagedPlan, cause: &DirectorError) -> bool {
        matches!(
            cause.kind,
            DirectorErrorKind::ForcedAbort | DirectorErrorKind::ContextViolation
        ) && plan.progress() >= self.threshold
    }
}

pub fn almost_complete_policy(config: &DirectorConfig) -> Box<dyn AlmostCompletePolicy> {
    match config.almost_complete_policy {
        AlmostCompleteMode::Abort => Box::new(AlwaysAbort),
        AlmostCompleteMode::LetFinish => {
            Box::new(LetFinishWhenAlmostComplete::new(config.almost_complete_threshold))
        }
    }
}
