use tokio::sync::mpsc;

use crate::{
    belief::BeliefUpdate,
    director::{OutboundPort, PlanResponse, PlanStatusReport},
    types::{OutboundCommand, OutboundMessage},
};

/// Outbound port that forwards every message to a writer task.
///
/// Belief commands (reactive effects and rollback compensations) are only
/// published. The local belief store sees them when something feeds them
/// back as inbound updates, either a peer owning the beliefs or the echo
/// installed with [`ChannelOutbound::with_belief_echo`].
#[derive(Debug, Clone)]
pub struct ChannelOutbound {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    belief_echo: Option<mpsc::UnboundedSender<BeliefUpdate>>,
}

impl ChannelOutbound {
    pub fn new(tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            tx,
            belief_echo: None,
        }
    }

    /// Also sends every published belief command to `echo` as an update.
    pub fn with_belief_echo(mut self, echo: mpsc::UnboundedSender<BeliefUpdate>) -> Self {
        self.belief_echo = Some(echo);
        self
    }

    fn echo(&self, command: &OutboundCommand) {
        let Some(echo) = &self.belief_echo else {
            return;
        };
        let update = match command {
            OutboundCommand::AddBelief { belief } => BeliefUpdate::Add {
                belief: belief.clone(),
            },
            OutboundCommand::DelBelief { belief } => BeliefUpdate::Remove {
                belief: belief.clone(),
            },
            OutboundCommand::AddDesire { .. }
            | OutboundCommand::BoostDesire { .. }
            | OutboundCommand::DelDesire { .. } => return,
        };
        if echo.send(update).is_err() {
            tracing::warn!(target: "bus", "belief_echo_closed_update_dropped");
        }
    }

    fn send(&self, message: OutboundMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!(target: "bus", "outbound_channel_closed_message_dropped");
        }
    }
}

impl OutboundPort for ChannelOutbound {
    fn publish_command(&self, command: OutboundCommand) {
        tracing::debug!(target: "bus", kind = command.kind_name(), "command_published");
        self.echo(&command);
        self.send(OutboundMessage::Command { command });
    }

    fn publish_status(&self, report: PlanStatusReport) {
        self.send(OutboundMessage::PlanStatus { report });
    }

    fn publish_response(&self, request_id: Option<String>, response: PlanResponse) {
        self.send(OutboundMessage::PlanResponse {
            request_id,
            response,
        });
    }
}
