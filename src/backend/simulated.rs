use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc},
    time::Instant,
};

use crate::{
    backend::{
        error::{BackendError, rejected, unavailable},
        ports::ExecutionBackend,
    },
    belief::{BeliefStore, BeliefUpdate},
    domain::{ActionDefinition, ActionEffect, DomainDefinition},
    plan::{ActionExecutionInfo, ActionStatus, ExecutionFeedback, ManagedPlan, PlanExecStatus},
};

/// In-process executor that plays a plan on the tokio clock. Actions start
/// at their planned time, finish after their duration and then apply their
/// declared effects to the backend's own fact view.
pub struct SimulatedBackend {
    domain: DomainDefinition,
    time_scale: f64,
    fact_sink: Option<mpsc::UnboundedSender<BeliefUpdate>>,
    state: Mutex<SimState>,
}

#[derive(Debug, Default)]
struct SimState {
    facts: BeliefStore,
    run: Option<SimRun>,
    offline: bool,
    failing_actions: BTreeSet<String>,
}

#[derive(Debug)]
struct SimRun {
    started_at: Instant,
    actions: Vec<ActionExecutionInfo>,
}

impl SimulatedBackend {
    pub fn new(domain: DomainDefinition) -> Self {
        let facts = BeliefStore::from_beliefs(domain.initial_beliefs.iter().cloned());
        Self {
            domain,
            time_scale: 1.0,
            fact_sink: None,
            state: Mutex::new(SimState {
                facts,
                ..SimState::default()
            }),
        }
    }

    /// Plan seconds elapsed per wall-clock second.
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale.max(f64::EPSILON);
        self
    }

    /// Receives the belief mutations caused by completed actions.
    pub fn with_fact_sink(mut self, sink: mpsc::UnboundedSender<BeliefUpdate>) -> Self {
        self.fact_sink = Some(sink);
        self
    }

    pub fn domain(&self) -> &DomainDefinition {
        &self.domain
    }

    /// Every call fails with `unavailable` while offline.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Actions with this name end in `failure` instead of `success`.
    pub async fn fail_action(&self, name: impl Into<String>) {
        self.state.lock().await.failing_actions.insert(name.into());
    }

    pub async fn facts(&self) -> BeliefStore {
        self.state.lock().await.facts.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.run.is_some()
    }

    fn apply_effects(&self, facts: &mut BeliefStore, action: &ActionExecutionInfo) {
        let Some(definition) = self.domain.action(&action.name) else {
            return;
        };
        let Some(binding) = definition.bind_args(&action.args) else {
            return;
        };

        for effect in &definition.effects {
            let update = match effect {
                ActionEffect::Add { belief } => belief
                    .instantiate(&binding)
                    .map(|belief| BeliefUpdate::Add { belief }),
                ActionEffect::Del { belief } => belief
                    .instantiate(&binding)
                    .map(|belief| BeliefUpdate::Remove { belief }),
            };
            let Some(update) = update else {
                continue;
            };
            facts.apply(update.clone());
            if let Some(sink) = &self.fact_sink {
                let _ = sink.send(update);
            }
        }
    }
}

fn ensure_online(state: &SimState) -> Result<(), BackendError> {
    if state.offline {
        return Err(unavailable("simulated backend is offline"));
    }
    Ok(())
}

#[async_trait]
impl ExecutionBackend for SimulatedBackend {
    async fn action_definition(
        &self,
        name: &str,
    ) -> Result<Option<ActionDefinition>, BackendError> {
        ensure_online(&*self.state.lock().await)?;
        Ok(self.domain.action(name).cloned())
    }

    async fn validate_instance(
        &self,
        instance: &str,
        type_name: &str,
    ) -> Result<bool, BackendError> {
        ensure_online(&*self.state.lock().await)?;
        Ok(self.domain.is_instance_of(instance, type_name))
    }

    async fn submit_plan(&self, plan: &ManagedPlan) -> Result<bool, BackendError> {
        let mut state = self.state.lock().await;
        ensure_online(&state)?;
        if state.run.is_some() {
            return Ok(false);
        }
        if let Some(unknown) = plan
            .actions()
            .iter()
            .find(|action| self.domain.action(&action.name).is_none())
        {
            return Err(rejected(format!(
                "action '{}' is not part of the domain",
                unknown.name
            )));
        }

        let actions = plan
            .actions()
            .iter()
            .map(|action| ActionExecutionInfo {
                status: ActionStatus::Unknown,
                exec_start: None,
                exec_end: None,
                progress: 0.0,
                ..action.clone()
            })
            .collect();
        state.run = Some(SimRun {
            started_at: Instant::now(),
            actions,
        });
        tracing::debug!(
            target: "backend",
            plan_id = plan.plan_id(),
            actions = plan.actions().len(),
            "simulated_plan_started"
        );
        Ok(true)
    }

    async fn cancel_plan(&self) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        ensure_online(&state)?;
        state.run = None;
        Ok(())
    }

    async fn poll_feedback(&self) -> Result<Option<ExecutionFeedback>, BackendError> {
        let mut guard = self.state.lock().await;
        ensure_online(&guard)?;
        let SimState {
            facts,
            run,
            failing_actions,
            ..
        } = &mut *guard;
        let Some(current) = run.as_mut() else {
            return Ok(None);
        };

        let now = current.started_at.elapsed().as_secs_f64() * self.time_scale;
        let mut failed = false;
        for action in &mut current.actions {
            if action.status.is_finished() {
                failed |= action.status == ActionStatus::Failure;
                continue;
            }
            if failed || now < action.planned_start {
                continue;
            }

            let end = action.planned_end();
            action.exec_start = Some(action.planned_start);
            if now < end {
                action.status = ActionStatus::Running;
                action.progress = ((now - action.planned_start) / action.duration) as f32;
                continue;
            }

            action.exec_end = Some(end);
            action.progress = 1.0;
            if failing_actions.contains(&action.name) {
                action.status = ActionStatus::Failure;
                failed = true;
            } else {
                action.status = ActionStatus::Success;
                self.apply_effects(facts, action);
            }
        }

        let status = if failed {
            PlanExecStatus::Failed
        } else if current
            .actions
            .iter()
            .all(|action| action.status == ActionStatus::Success)
        {
            PlanExecStatus::Success
        } else {
            PlanExecStatus::Running
        };
        let feedback = ExecutionFeedback {
            status,
            current_time: now,
            actions: current.actions.clone(),
        };
        if status.is_terminal() {
            *run = None;
        }
        Ok(Some(feedback))
    }
}
