use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{
    sync::mpsc::{self, error::TryRecvError},
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{
    belief::BeliefStore,
    config::{AgentLoopConfig, TickMissedBehavior},
    director::{
        DirectorError, OutboundPort, PlanDirector, PlanOutcome, PlanRequest, PlanResponse,
        error::rejected_request,
    },
    reactive::ReactiveRuleEngine,
    types::InboundEvent,
};

/// Single task owning the belief store, the rule engine and the director.
/// Each tick drains the inbound queue, applies beliefs, lets the rules
/// react, answers plan requests and then steps the director.
pub struct AgentLoop {
    config: AgentLoopConfig,
    beliefs: BeliefStore,
    rules: ReactiveRuleEngine,
    director: PlanDirector,
    outbound: Arc<dyn OutboundPort>,
    inbound_rx: mpsc::Receiver<InboundEvent>,
    inbound_closed: bool,
}

impl AgentLoop {
    pub fn new(
        config: AgentLoopConfig,
        beliefs: BeliefStore,
        rules: ReactiveRuleEngine,
        director: PlanDirector,
        outbound: Arc<dyn OutboundPort>,
        inbound_rx: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        if rules.is_idle() {
            tracing::info!(
                target: "agent_loop",
                "no_reactive_rules_configured_reactive_duties_disabled"
            );
        }
        Self {
            config,
            beliefs,
            rules,
            director,
            outbound,
            inbound_rx,
            inbound_closed: false,
        }
    }

    pub fn beliefs(&self) -> &BeliefStore {
        &self.beliefs
    }

    pub fn director(&self) -> &PlanDirector {
        &self.director
    }

    #[tracing::instrument(name = "agent_loop_run", target = "agent_loop", skip_all)]
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(missed_tick_behavior(&self.config.tick_missed_behavior));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_tick().await;
                }
            }
        }

        tracing::info!(
            target: "agent_loop",
            state = ?self.director.state(),
            beliefs = self.beliefs.len(),
            "agent_loop_stopped"
        );
        Ok(())
    }

    /// One full pass: beliefs, then reactive rules, then plan requests, then
    /// the director's feedback and context step.
    pub async fn run_tick(&mut self) -> Vec<PlanOutcome> {
        let mut beliefs_changed = false;
        let mut requests: Vec<(Option<String>, Result<PlanRequest, DirectorError>)> = Vec::new();

        while !self.inbound_closed {
            match self.inbound_rx.try_recv() {
                Ok(InboundEvent::Belief(update)) => {
                    beliefs_changed |= self.beliefs.apply(update);
                }
                Ok(InboundEvent::PeerStatus { peer, status }) => {
                    self.director.on_peer_status(&peer, status);
                }
                Ok(InboundEvent::PlanRequest {
                    request_id,
                    request,
                }) => requests.push((request_id, Ok(request))),
                Ok(InboundEvent::MalformedPlanRequest { request_id, reason }) => requests.push((
                    request_id,
                    Err(rejected_request(format!("malformed plan request: {reason}"))),
                )),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::info!(target: "agent_loop", "inbound_queue_closed");
                    self.inbound_closed = true;
                }
            }
        }

        if beliefs_changed && !self.rules.is_idle() {
            let commands = self.rules.on_belief_update(&self.beliefs);
            if !commands.is_empty() {
                tracing::debug!(
                    target: "agent_loop",
                    commands = commands.len(),
                    "reactive_commands_emitted"
                );
            }
            for command in commands {
                self.outbound.publish_command(command);
            }
        }

        for (request_id, request) in requests {
            let response = match request {
                Ok(request) => self.director.handle_request(request, &self.beliefs).await,
                Err(err) => {
                    tracing::warn!(
                        target: "agent_loop",
                        request_id = request_id.as_deref(),
                        reason = %err,
                        "malformed_plan_request_rejected"
                    );
                    PlanResponse::rejected(&err)
                }
            };
            self.outbound.publish_response(request_id, response);
        }

        self.director.tick(&self.beliefs).await
    }
}

fn missed_tick_behavior(behavior: &TickMissedBehavior) -> MissedTickBehavior {
    match behavior {
        TickMissedBehavior::Skip => MissedTickBehavior::Skip,
        TickMissedBehavior::Delay => MissedTickBehavior::Delay,
        TickMissedBehavior::Burst => MissedTickBehavior::Burst,
    }
}
