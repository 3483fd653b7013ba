use std::{collections::BTreeMap, future::Future, sync::Arc, time::Duration};

use tokio::time::Instant;

use crate::{
    backend::{
        ExecutionBackend,
        error::{BackendError, BackendErrorKind, timeout},
    },
    belief::BeliefStore,
    condition::ConditionEvaluator,
    config::DirectorConfig,
    director::{
        error::{
            DirectorError, DirectorErrorKind, backend_unavailable, context_violation,
            deadline_exceeded, forced_abort, rejected_request,
        },
        policy::{AlmostCompletePolicy, ReschedulePolicy, almost_complete_policy},
        ports::OutboundPort,
        readiness::{PeerStatus, ReadinessTracker},
        reliability::FailureStreak,
        types::{
            DirectorState, PlanBody, PlanOutcome, PlanRequest, PlanRequestKind, PlanResponse,
            PlanStatusReport,
        },
    },
    domain::ActionDefinition,
    plan::{
        ActionExecutionInfo, ManagedPlan, PlanExecStatus, compute_rollback, rollback_actions,
    },
};

/// Plan in the director's hands. `history` holds the actions a resumed plan
/// already completed before it was paused, so rollback still covers them.
#[derive(Debug, Clone)]
struct ActivePlan {
    plan: ManagedPlan,
    history: Vec<ActionExecutionInfo>,
}

impl ActivePlan {
    fn fresh(plan: ManagedPlan) -> Self {
        Self {
            plan,
            history: Vec::new(),
        }
    }
}

/// Drives one plan at a time through the execution backend.
///
/// The director never blocks on its own: every backend call is bounded by
/// the configured response timeout, and the owning loop calls [`tick`] at a
/// fixed cadence. Aborts requested between ticks take effect on the next
/// tick.
///
/// [`tick`]: PlanDirector::tick
pub struct PlanDirector {
    config: DirectorConfig,
    backend: Arc<dyn ExecutionBackend>,
    outbound: Arc<dyn OutboundPort>,
    almost_complete: Box<dyn AlmostCompletePolicy>,
    state: DirectorState,
    readiness: ReadinessTracker,
    boot_started: Instant,
    degraded: bool,
    current: Option<ActivePlan>,
    retained: Option<ActivePlan>,
    queued: Option<ManagedPlan>,
    pending_abort: Option<DirectorError>,
    letting_finish: bool,
    failures: FailureStreak,
    definitions: BTreeMap<String, ActionDefinition>,
}

impl PlanDirector {
    pub fn new(
        config: DirectorConfig,
        backend: Arc<dyn ExecutionBackend>,
        outbound: Arc<dyn OutboundPort>,
    ) -> Self {
        Self {
            almost_complete: almost_complete_policy(&config),
            readiness: ReadinessTracker::new(config.expected_peers.iter().cloned()),
            failures: FailureStreak::new(config.max_backend_tries),
            config,
            backend,
            outbound,
            state: DirectorState::Starting,
            boot_started: Instant::now(),
            degraded: false,
            current: None,
            retained: None,
            queued: None,
            pending_abort: None,
            letting_finish: false,
            definitions: BTreeMap::new(),
        }
    }

    pub fn with_almost_complete_policy(mut self, policy: Box<dyn AlmostCompletePolicy>) -> Self {
        self.almost_complete = policy;
        self
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn readiness(&self) -> &ReadinessTracker {
        &self.readiness
    }

    pub fn current_plan(&self) -> Option<&ManagedPlan> {
        self.current.as_ref().map(|active| &active.plan)
    }

    pub fn retained_plan(&self) -> Option<&ManagedPlan> {
        self.retained.as_ref().map(|active| &active.plan)
    }

    pub fn queued_plan(&self) -> Option<&ManagedPlan> {
        self.queued.as_ref()
    }

    pub fn on_peer_status(&mut self, peer: &str, status: PeerStatus) {
        if !self.readiness.update(peer, status) {
            tracing::debug!(target: "director", peer = peer, "unexpected_peer_status_ignored");
            return;
        }
        if status == PeerStatus::Error {
            tracing::warn!(target: "director", peer = peer, "peer_reported_error");
        }
        if self.state == DirectorState::Starting && self.readiness.all_running() {
            self.transition(DirectorState::Ready, "all_peers_running");
        }
    }

    #[tracing::instrument(
        name = "director_handle_request",
        target = "director",
        skip(self, request, beliefs),
        fields(kind = ?request.kind, state = ?self.state)
    )]
    pub async fn handle_request(
        &mut self,
        request: PlanRequest,
        beliefs: &BeliefStore,
    ) -> PlanResponse {
        let result = match request.kind {
            PlanRequestKind::Abort => self.request_abort(),
            PlanRequestKind::Execute => self.request_execute(request.body, beliefs).await,
        };

        match result {
            Ok(()) => PlanResponse::accepted(),
            Err(err) => {
                tracing::info!(
                    target: "director",
                    error_kind = ?err.kind,
                    reason = %err,
                    "plan_request_rejected"
                );
                PlanResponse::rejected(&err)
            }
        }
    }

    /// One evaluation step of the state machine. Returns the plans that left
    /// the director during this step.
    #[tracing::instrument(
        name = "director_tick",
        target = "director",
        skip(self, beliefs),
        fields(state = ?self.state)
    )]
    pub async fn tick(&mut self, beliefs: &BeliefStore) -> Vec<PlanOutcome> {
        match self.state {
            DirectorState::Starting => {
                self.check_boot();
                Vec::new()
            }
            DirectorState::Ready => Vec::new(),
            DirectorState::Paused => self.advance_paused().await,
            DirectorState::Executing => self.monitor(beliefs).await,
        }
    }

    fn check_boot(&mut self) {
        if self.readiness.all_running() {
            self.transition(DirectorState::Ready, "all_peers_running");
            return;
        }
        if self.boot_started.elapsed() >= self.config.boot_timeout() {
            self.degraded = true;
            tracing::warn!(
                target: "director",
                pending_peers = ?self.readiness.pending(),
                boot_timeout_ms = self.config.boot_timeout_ms,
                "boot_wait_expired_entering_degraded_mode"
            );
            self.transition(DirectorState::Ready, "boot_wait_expired");
        }
    }

    fn request_abort(&mut self) -> Result<(), DirectorError> {
        match self.state {
            DirectorState::Executing if self.letting_finish => Err(rejected_request(
                "plan is almost complete and is being let finish",
            )),
            DirectorState::Executing | DirectorState::Paused => {
                self.pending_abort = Some(forced_abort("abort requested"));
                Ok(())
            }
            DirectorState::Starting | DirectorState::Ready => {
                Err(rejected_request("no plan is executing"))
            }
        }
    }

    async fn request_execute(
        &mut self,
        body: Option<PlanBody>,
        beliefs: &BeliefStore,
    ) -> Result<(), DirectorError> {
        if self.state == DirectorState::Starting {
            return Err(rejected_request("director is still starting"));
        }
        let body = body.ok_or_else(|| rejected_request("execute request carries no plan"))?;
        let plan = self.validate(body, beliefs).await?;

        match self.state {
            DirectorState::Ready => {
                self.submit(&plan).await?;
                self.install(ActivePlan::fresh(plan));
                Ok(())
            }
            DirectorState::Executing => match self.config.reschedule_policy {
                ReschedulePolicy::NoPreempt => Err(rejected_request(format!(
                    "plan {} is executing",
                    self.current_plan().map(ManagedPlan::plan_id).unwrap_or("?")
                ))),
                ReschedulePolicy::Preempt => {
                    self.abort_current(forced_abort("preempted by a new plan"))
                        .await;
                    self.submit(&plan).await?;
                    self.install(ActivePlan::fresh(plan));
                    Ok(())
                }
                ReschedulePolicy::PreemptRetain => {
                    self.pause_current(plan).await;
                    Ok(())
                }
            },
            DirectorState::Paused => Err(rejected_request("a preempting plan is already queued")),
            DirectorState::Starting => Err(rejected_request("director is still starting")),
        }
    }

    async fn validate(
        &mut self,
        body: PlanBody,
        beliefs: &BeliefStore,
    ) -> Result<ManagedPlan, DirectorError> {
        let items = body.resolve_items()?;
        if items.is_empty() {
            return Err(rejected_request("plan has no actions"));
        }

        for item in &items {
            let definition = self.lookup_definition(&item.name).await?;
            if definition.parameters.len() != item.args.len() {
                return Err(rejected_request(format!(
                    "action {} expects {} arguments, got {}",
                    item.name,
                    definition.parameters.len(),
                    item.args.len()
                )));
            }
            for (param, arg) in definition.parameters.iter().zip(&item.args) {
                let valid = bounded(
                    self.config.response_timeout(),
                    "validate_instance",
                    self.backend.validate_instance(arg, &param.type_name),
                )
                .await
                .map_err(|err| backend_call_failed("instance validation", err))?;
                if !valid {
                    return Err(rejected_request(format!(
                        "'{arg}' is not a valid {} for parameter {} of {}",
                        param.type_name, param.name, item.name
                    )));
                }
            }
        }

        let plan = body.into_plan(items);
        if self.config.check_precondition
            && !ConditionEvaluator::is_satisfied(plan.precondition(), beliefs)
        {
            return Err(rejected_request(format!(
                "precondition of plan for {} does not hold",
                plan.plan_target().name
            )));
        }
        Ok(plan)
    }

    async fn lookup_definition(&mut self, name: &str) -> Result<ActionDefinition, DirectorError> {
        if let Some(definition) = self.definitions.get(name) {
            return Ok(definition.clone());
        }
        let definition = bounded(
            self.config.response_timeout(),
            "action_definition",
            self.backend.action_definition(name),
        )
        .await
        .map_err(|err| backend_call_failed("action lookup", err))?
        .ok_or_else(|| rejected_request(format!("unknown action '{name}'")))?;
        self.definitions
            .insert(name.to_string(), definition.clone());
        Ok(definition)
    }

    /// Hands `plan` to the backend, retrying communication failures up to
    /// `max_backend_tries` (once in degraded mode).
    async fn submit(&self, plan: &ManagedPlan) -> Result<(), DirectorError> {
        let attempts = if self.degraded {
            1
        } else {
            self.config.max_backend_tries.max(1)
        };
        let mut last_error = None;
        for attempt in 1..=attempts {
            match bounded(
                self.config.response_timeout(),
                "submit_plan",
                self.backend.submit_plan(plan),
            )
            .await
            {
                Ok(true) => return Ok(()),
                Ok(false) => return Err(rejected_request("backend refused the plan")),
                Err(err) if err.is_communication_failure() => {
                    tracing::warn!(
                        target: "director",
                        plan_id = plan.plan_id(),
                        attempt = attempt,
                        attempts = attempts,
                        error = %err,
                        "plan_submit_failed"
                    );
                    last_error = Some(err);
                }
                Err(err) => return Err(backend_call_failed("plan submission", err)),
            }
        }

        Err(backend_unavailable(format!(
            "plan submission failed after {attempts} attempts: {}",
            last_error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no attempt made".to_string())
        )))
    }

    fn install(&mut self, mut active: ActivePlan) {
        active.plan.set_exec_status(PlanExecStatus::Running);
        tracing::info!(
            target: "director",
            plan_id = active.plan.plan_id(),
            target_desire = %active.plan.plan_target().name,
            goal = %active.plan.plan_target().to_pddl_goal(),
            actions = active.plan.actions().len(),
            planned_deadline = active.plan.planned_deadline(),
            "plan_execution_started"
        );
        self.outbound
            .publish_status(PlanStatusReport::from_plan(&active.plan, None));
        self.current = Some(active);
        self.failures.record_success();
        self.letting_finish = false;
        self.transition(DirectorState::Executing, "plan_submitted");
    }

    async fn pause_current(&mut self, next: ManagedPlan) {
        let Some(current) = self.current.take() else {
            self.queued = Some(next);
            self.transition(DirectorState::Paused, "plan_queued");
            return;
        };
        self.cancel_at_backend(current.plan.plan_id()).await;
        tracing::info!(
            target: "director",
            retained_plan_id = current.plan.plan_id(),
            queued_plan_id = next.plan_id(),
            success_ratio = current.plan.success_ratio(),
            "plan_paused_for_preemption"
        );
        self.retained = Some(current);
        self.queued = Some(next);
        self.pending_abort = None;
        self.letting_finish = false;
        self.transition(DirectorState::Paused, "preempted_with_retain");
    }

    async fn advance_paused(&mut self) -> Vec<PlanOutcome> {
        if let Some(cause) = self.pending_abort.take() {
            let mut outcomes = Vec::new();
            if let Some(queued) = self.queued.take() {
                outcomes.push(self.terminate(
                    ActivePlan::fresh(queued),
                    PlanExecStatus::Aborted,
                    Some(cause.clone()),
                    false,
                ));
            }
            if let Some(retained) = self.retained.take() {
                outcomes.push(self.terminate(
                    retained,
                    PlanExecStatus::Aborted,
                    Some(cause),
                    true,
                ));
            }
            self.transition(DirectorState::Ready, "aborted_while_paused");
            return outcomes;
        }

        let Some(queued) = self.queued.take() else {
            return self.resume_retained().await;
        };
        match self.submit(&queued).await {
            Ok(()) => {
                self.install(ActivePlan::fresh(queued));
                Vec::new()
            }
            Err(err) => {
                let mut outcomes = vec![self.terminate(
                    ActivePlan::fresh(queued),
                    PlanExecStatus::Aborted,
                    Some(err),
                    false,
                )];
                outcomes.extend(self.resume_retained().await);
                outcomes
            }
        }
    }

    async fn resume_retained(&mut self) -> Vec<PlanOutcome> {
        let Some(mut retained) = self.retained.take() else {
            self.transition(DirectorState::Ready, "no_plan_left");
            return Vec::new();
        };

        let Some(remaining) = retained.plan.remaining() else {
            let outcome = self.terminate(retained, PlanExecStatus::Success, None, false);
            self.transition(DirectorState::Ready, "retained_plan_already_complete");
            return vec![outcome];
        };

        match self.submit(&remaining).await {
            Ok(()) => {
                tracing::info!(
                    target: "director",
                    plan_id = remaining.plan_id(),
                    remaining_actions = remaining.actions().len(),
                    "retained_plan_resumed"
                );
                let mut history = std::mem::take(&mut retained.history);
                history.extend(retained.plan.successful_actions().cloned());
                self.install(ActivePlan {
                    plan: remaining,
                    history,
                });
                Vec::new()
            }
            Err(err) => {
                let outcome = self.terminate(retained, PlanExecStatus::Aborted, Some(err), true);
                self.transition(DirectorState::Ready, "retained_plan_resume_failed");
                vec![outcome]
            }
        }
    }

    async fn monitor(&mut self, beliefs: &BeliefStore) -> Vec<PlanOutcome> {
        if let Some(cause) = self.pending_abort.take() {
            if !self.downgrade_abort(&cause) {
                return self.abort_current(cause).await;
            }
        }

        let polled = bounded(
            self.config.response_timeout(),
            "poll_feedback",
            self.backend.poll_feedback(),
        )
        .await;
        match polled {
            Ok(feedback) => {
                self.failures.record_success();
                if let (Some(feedback), Some(active)) = (feedback, self.current.as_mut()) {
                    active.plan.apply_feedback(&feedback);
                }
            }
            Err(err) => {
                let exhausted = self.failures.record_failure();
                tracing::warn!(
                    target: "director",
                    error = %err,
                    failure_streak = self.failures.streak(),
                    max_backend_tries = self.failures.limit(),
                    "feedback_poll_failed"
                );
                if exhausted {
                    return self
                        .abort_current(backend_unavailable(format!(
                            "backend unreachable after {} consecutive failures: {err}",
                            self.failures.streak()
                        )))
                        .await;
                }
            }
        }

        let Some(active) = self.current.as_ref() else {
            self.transition(DirectorState::Ready, "no_current_plan");
            return Vec::new();
        };
        let status = active.plan.exec_status();
        if status.is_terminal() {
            return self.finish_current(status).await;
        }

        if self.config.check_context
            && !self.letting_finish
            && !ConditionEvaluator::is_satisfied(active.plan.context(), beliefs)
        {
            let cause = context_violation(format!(
                "context of plan {} no longer holds",
                active.plan.plan_id()
            ));
            tracing::info!(
                target: "director",
                plan_id = active.plan.plan_id(),
                "context_violation"
            );
            if !self.downgrade_abort(&cause) {
                return self.abort_current(cause).await;
            }
        }

        if let (Some(factor), Some(active)) =
            (self.config.deadline_abort_factor, self.current.as_ref())
        {
            let limit = factor * active.plan.estimated_deadline();
            if active.plan.last_reported_time() > limit {
                let cause = deadline_exceeded(format!(
                    "time {:.3} passed {factor} x estimated deadline {:.3}",
                    active.plan.last_reported_time(),
                    active.plan.estimated_deadline()
                ));
                return self.abort_current(cause).await;
            }
        }

        if let Some(active) = self.current.as_ref() {
            self.outbound
                .publish_status(PlanStatusReport::from_plan(&active.plan, None));
        }
        Vec::new()
    }

    fn downgrade_abort(&mut self, cause: &DirectorError) -> bool {
        if self.letting_finish {
            return true;
        }
        let Some(active) = self.current.as_ref() else {
            return false;
        };
        if !self.almost_complete.let_finish(&active.plan, cause) {
            return false;
        }
        tracing::info!(
            target: "director",
            plan_id = active.plan.plan_id(),
            progress = active.plan.progress(),
            cause = %cause,
            "abort_downgraded_to_let_finish"
        );
        self.letting_finish = true;
        true
    }

    async fn abort_current(&mut self, cause: DirectorError) -> Vec<PlanOutcome> {
        let Some(active) = self.current.take() else {
            self.transition(DirectorState::Ready, "nothing_to_abort");
            return Vec::new();
        };
        self.cancel_at_backend(active.plan.plan_id()).await;

        let drops_everything = matches!(
            cause.kind,
            DirectorErrorKind::ForcedAbort | DirectorErrorKind::BackendUnavailable
        );
        let mut outcomes = vec![self.terminate(
            active,
            PlanExecStatus::Aborted,
            Some(cause.clone()),
            true,
        )];

        if drops_everything {
            self.queued = None;
            if let Some(retained) = self.retained.take() {
                outcomes.push(self.terminate(
                    retained,
                    PlanExecStatus::Aborted,
                    Some(cause),
                    true,
                ));
            }
            self.transition(DirectorState::Ready, "plan_aborted");
        } else {
            outcomes.extend(self.resume_retained().await);
        }
        outcomes
    }

    async fn finish_current(&mut self, status: PlanExecStatus) -> Vec<PlanOutcome> {
        let Some(active) = self.current.take() else {
            self.transition(DirectorState::Ready, "no_current_plan");
            return Vec::new();
        };
        let mut outcomes = vec![self.terminate(active, status, None, false)];
        outcomes.extend(self.resume_retained().await);
        outcomes
    }

    async fn cancel_at_backend(&self, plan_id: &str) {
        if let Err(err) = bounded(
            self.config.response_timeout(),
            "cancel_plan",
            self.backend.cancel_plan(),
        )
        .await
        {
            tracing::warn!(
                target: "director",
                plan_id = plan_id,
                error = %err,
                "plan_cancel_failed"
            );
        }
    }

    /// Closes out a plan: publishes its rollback commands (when asked to)
    /// and its final status entry.
    fn terminate(
        &mut self,
        mut active: ActivePlan,
        status: PlanExecStatus,
        cause: Option<DirectorError>,
        rollback: bool,
    ) -> PlanOutcome {
        active.plan.set_exec_status(status);
        let commands = if rollback {
            let mut commands = compute_rollback(&active.plan, &self.definitions);
            commands.extend(rollback_actions(&active.history, &self.definitions));
            commands
        } else {
            Vec::new()
        };
        for command in &commands {
            self.outbound.publish_command(command.clone());
        }

        let reason = cause.as_ref().map(DirectorError::to_string);
        self.outbound
            .publish_status(PlanStatusReport::from_plan(&active.plan, reason.clone()));

        match status {
            PlanExecStatus::Success => tracing::info!(
                target: "director",
                plan_id = active.plan.plan_id(),
                current_time = active.plan.last_reported_time(),
                estimated_deadline = active.plan.estimated_deadline(),
                "plan_execution_succeeded"
            ),
            _ => tracing::warn!(
                target: "director",
                plan_id = active.plan.plan_id(),
                status = ?status,
                cause = ?cause.as_ref().map(|err| err.kind),
                reason = ?reason,
                rollback_commands = commands.len(),
                "plan_execution_ended"
            ),
        }

        self.letting_finish = false;
        PlanOutcome {
            plan_id: active.plan.plan_id().to_string(),
            status,
            cause: cause.map(|err| err.kind),
            rollback: commands,
        }
    }

    fn transition(&mut self, next: DirectorState, reason: &'static str) {
        if self.state == next {
            return;
        }
        tracing::info!(
            target: "director",
            from = ?self.state,
            to = ?next,
            reason = reason,
            "director_state_changed"
        );
        self.state = next;
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(timeout(format!(
            "{operation} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

fn backend_call_failed(what: &str, err: BackendError) -> DirectorError {
    match err.kind {
        BackendErrorKind::Rejected => rejected_request(format!("{what} rejected: {err}")),
        BackendErrorKind::Timeout | BackendErrorKind::Unavailable => {
            backend_unavailable(format!("{what} failed: {err}"))
        }
    }
}
