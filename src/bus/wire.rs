use serde::Deserialize;
use serde_json::Value;

use crate::{
    belief::{Belief, BeliefUpdate},
    director::{PeerStatus, PlanBody, PlanRequest, PlanRequestKind},
    types::{InboundEvent, OutboundMessage},
};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum WireMessage {
    AddBelief {
        belief: Belief,
    },
    DelBelief {
        belief: Belief,
    },
    SetBeliefs {
        beliefs: Vec<Belief>,
    },
    PeerStatus {
        peer: String,
        status: PeerStatus,
    },
    PlanRequest {
        #[serde(default)]
        request_id: Option<String>,
        kind: PlanRequestKind,
        #[serde(default)]
        body: Option<PlanBody>,
    },
}

/// Parses one inbound NDJSON line. A line that names itself a
/// `plan_request` but does not deserialize still yields an event, so the
/// requester can be answered with a rejection.
pub fn parse_inbound_message(line: &str) -> Result<InboundEvent, serde_json::Error> {
    match serde_json::from_str::<WireMessage>(line) {
        Ok(wire) => Ok(into_event(wire)),
        Err(err) => malformed_plan_request(line, &err).ok_or(err),
    }
}

fn into_event(wire: WireMessage) -> InboundEvent {
    match wire {
        WireMessage::AddBelief { belief } => InboundEvent::Belief(BeliefUpdate::Add { belief }),
        WireMessage::DelBelief { belief } => {
            InboundEvent::Belief(BeliefUpdate::Remove { belief })
        }
        WireMessage::SetBeliefs { beliefs } => {
            InboundEvent::Belief(BeliefUpdate::ReplaceAll { beliefs })
        }
        WireMessage::PeerStatus { peer, status } => InboundEvent::PeerStatus { peer, status },
        WireMessage::PlanRequest {
            request_id,
            kind,
            body,
        } => InboundEvent::PlanRequest {
            request_id,
            request: PlanRequest { kind, body },
        },
    }
}

fn malformed_plan_request(line: &str, err: &serde_json::Error) -> Option<InboundEvent> {
    let value: Value = serde_json::from_str(line).ok()?;
    if value.get("type")?.as_str()? != "plan_request" {
        return None;
    }
    let request_id = value
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(InboundEvent::MalformedPlanRequest {
        request_id,
        reason: err.to_string(),
    })
}

pub fn encode_outbound_message(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_string(message)?;
    Ok(format!("{encoded}\n"))
}
