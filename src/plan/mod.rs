pub mod codec;
pub mod deadline;
pub mod managed;
pub mod rollback;
pub mod types;

pub use codec::{PlanTextError, format_plan_text, parse_plan_text};
pub use deadline::estimate_deadline;
pub use managed::{CommittedStatus, ManagedPlan};
pub use rollback::{compute_rollback, rollback_actions};
pub use types::{
    ActionExecutionInfo, ActionKey, ActionStatus, ExecutionFeedback, PlanExecStatus, PlanItem,
    full_action_name,
};
