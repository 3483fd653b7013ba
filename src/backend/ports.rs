use async_trait::async_trait;

use crate::{
    backend::error::BackendError,
    domain::ActionDefinition,
    plan::{ExecutionFeedback, ManagedPlan},
};

/// Planning/execution service the director drives. At most one plan runs
/// at a time.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn action_definition(&self, name: &str)
    -> Result<Option<ActionDefinition>, BackendError>;

    async fn validate_instance(&self, instance: &str, type_name: &str)
    -> Result<bool, BackendError>;

    /// `Ok(false)` when the backend refuses the plan.
    async fn submit_plan(&self, plan: &ManagedPlan) -> Result<bool, BackendError>;

    async fn cancel_plan(&self) -> Result<(), BackendError>;

    /// Latest snapshot of the running plan, `None` when nothing runs.
    async fn poll_feedback(&self) -> Result<Option<ExecutionFeedback>, BackendError>;
}
