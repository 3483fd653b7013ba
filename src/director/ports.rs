use crate::{
    director::types::{PlanResponse, PlanStatusReport},
    types::OutboundCommand,
};

/// Outward side of the agent: the fact bus and the plan request/status
/// channels.
pub trait OutboundPort: Send + Sync {
    fn publish_command(&self, command: OutboundCommand);

    fn publish_status(&self, report: PlanStatusReport);

    fn publish_response(&self, request_id: Option<String>, response: PlanResponse);
}
