use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use volition::{
    agent_loop::AgentLoop,
    backend::SimulatedBackend,
    belief::BeliefStore,
    bus::{ChannelOutbound, pump_inbound, pump_outbound},
    cli::config_path_from_args,
    config::Config,
    director::{OutboundPort, PlanDirector},
    domain::DomainDefinition,
    logging::init_tracing,
    reactive::{ReactiveRuleEngine, load_rules},
    types::InboundEvent,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let domain = DomainDefinition::load(&config.backend.domain_path)?;
    let rules = match &config.reactive.rules_path {
        Some(path) => load_rules(path)?,
        None => Vec::new(),
    };
    let beliefs = BeliefStore::from_beliefs(domain.initial_beliefs.iter().cloned());

    let (inbound_tx, inbound_rx) = mpsc::channel(config.r#loop.inbound_queue_capacity.max(1));
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (fact_tx, mut fact_rx) = mpsc::unbounded_channel();

    let belief_echo_tx = fact_tx.clone();
    let backend = Arc::new(
        SimulatedBackend::new(domain)
            .with_time_scale(config.backend.time_scale)
            .with_fact_sink(fact_tx),
    );
    let outbound: Arc<dyn OutboundPort> =
        Arc::new(ChannelOutbound::new(outbound_tx).with_belief_echo(belief_echo_tx));
    let director = PlanDirector::new(config.director.clone(), backend, Arc::clone(&outbound));
    let engine = ReactiveRuleEngine::new(rules);
    tracing::info!(
        target: "reactive",
        rules = engine.rules().len(),
        "reactive_rules_loaded"
    );
    let agent = AgentLoop::new(
        config.r#loop.clone(),
        beliefs,
        engine,
        director,
        outbound,
        inbound_rx,
    );

    let shutdown = CancellationToken::new();
    let fact_inbound = inbound_tx.clone();
    let fact_task = tokio::spawn(async move {
        while let Some(update) = fact_rx.recv().await {
            if fact_inbound.send(InboundEvent::Belief(update)).await.is_err() {
                break;
            }
        }
    });
    let reader_task = tokio::spawn(pump_inbound(
        tokio::io::stdin(),
        inbound_tx,
        shutdown.clone(),
    ));
    let writer_task = tokio::spawn(pump_outbound(tokio::io::stdout(), outbound_rx));
    let agent_task = tokio::spawn(agent.run(shutdown.clone()));

    tracing::info!(
        target: "agent_loop",
        run_id = logging_guard.run_id(),
        config = %config_path.display(),
        "volition_started"
    );

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let signal_name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };

    shutdown.cancel();
    agent_task.await.context("agent loop task join failed")??;
    reader_task.abort();
    if let Err(err) = fact_task.await {
        tracing::warn!(target: "agent_loop", error = %err, "fact_forwarder_join_failed");
    }
    match writer_task.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(target: "bus", error = %err, "stdout_writer_failed"),
        Err(err) => tracing::warn!(target: "bus", error = %err, "stdout_writer_join_failed"),
    }

    eprintln!("volition stopped: received {signal_name}");
    Ok(())
}
