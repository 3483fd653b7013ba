use serde::{Deserialize, Serialize};

use crate::{
    belief::{Belief, BeliefUpdate},
    desire::Desire,
    director::{PeerStatus, PlanRequest, PlanResponse, PlanStatusReport},
};

/// Mutation published to the fact bus. Produced by reactive rules and by
/// plan rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    AddBelief { belief: Belief },
    DelBelief { belief: Belief },
    AddDesire { desire: Desire },
    BoostDesire { desire: Desire },
    DelDesire { desire: Desire },
}

impl OutboundCommand {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::AddBelief { .. } => "add_belief",
            Self::DelBelief { .. } => "del_belief",
            Self::AddDesire { .. } => "add_desire",
            Self::BoostDesire { .. } => "boost_desire",
            Self::DelDesire { .. } => "del_desire",
        }
    }
}

/// Everything the agent loop consumes from the outside.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Belief(BeliefUpdate),
    PeerStatus {
        peer: String,
        status: PeerStatus,
    },
    PlanRequest {
        request_id: Option<String>,
        request: PlanRequest,
    },
    /// A plan request whose payload could not be decoded. It is answered
    /// with a rejection in the same order as well-formed requests.
    MalformedPlanRequest {
        request_id: Option<String>,
        reason: String,
    },
}

/// Everything the agent publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Command {
        command: OutboundCommand,
    },
    PlanStatus {
        report: PlanStatusReport,
    },
    PlanResponse {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        response: PlanResponse,
    },
}
