use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use volition::{
    belief::Belief,
    config::DirectorConfig,
    director::{AlmostCompleteMode, DirectorErrorKind, DirectorState, PlanRequest},
    plan::{ActionStatus, PlanExecStatus},
    types::OutboundCommand,
};

use crate::{
    InstrumentedBackend, advance_secs, config, initial_beliefs, kitchen_body, ready_director,
    running_feedback, without_fuel,
};

fn kitchen_rollback() -> Vec<OutboundCommand> {
    vec![
        OutboundCommand::DelBelief {
            belief: Belief::predicate("in", &["robot1", "kitchen"]),
        },
        OutboundCommand::AddBelief {
            belief: Belief::predicate("in", &["robot1", "dock1"]),
        },
    ]
}

#[tokio::test(start_paused = true)]
async fn given_plan_runs_to_completion_when_ticking_then_status_feed_ends_with_success() {
    let (mut director, outbound) =
        ready_director(config(), Arc::new(InstrumentedBackend::new())).await;
    let beliefs = initial_beliefs();
    let response = director
        .handle_request(PlanRequest::execute(kitchen_body()), &beliefs)
        .await;
    assert!(response.accepted);
    assert_eq!(director.state(), DirectorState::Executing);
    let plan_id = director
        .current_plan()
        .expect("plan installed")
        .plan_id()
        .to_string();

    advance_secs(6).await;
    assert!(director.tick(&beliefs).await.is_empty());
    let plan = director.current_plan().expect("plan still executing");
    assert_eq!(plan.actions()[0].status, ActionStatus::Success);
    assert_eq!(plan.actions()[1].status, ActionStatus::Running);

    advance_secs(5).await;
    let outcomes = director.tick(&beliefs).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].plan_id, plan_id);
    assert_eq!(outcomes[0].status, PlanExecStatus::Success);
    assert!(outcomes[0].rollback.is_empty());
    assert_eq!(director.state(), DirectorState::Ready);
    assert!(director.current_plan().is_none());

    let feed: Vec<PlanExecStatus> = outbound
        .statuses_for(&plan_id)
        .iter()
        .map(|report| report.status)
        .collect();
    assert_eq!(
        feed,
        vec![
            PlanExecStatus::Running,
            PlanExecStatus::Running,
            PlanExecStatus::Success
        ]
    );
    assert!(outbound.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn given_fuel_lost_mid_plan_when_ticking_then_plan_aborts_with_rollback_and_ready() {
    let backend = Arc::new(InstrumentedBackend::new());
    let (mut director, outbound) = ready_director(config(), backend.clone()).await;
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &initial_beliefs())
        .await;
    advance_secs(6).await;
    director.tick(&initial_beliefs()).await;
    assert_eq!(director.state(), DirectorState::Executing);

    let outcomes = director.tick(&without_fuel()).await;

    assert_eq!(director.state(), DirectorState::Ready);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, PlanExecStatus::Aborted);
    assert_eq!(outcomes[0].cause, Some(DirectorErrorKind::ContextViolation));
    assert_eq!(outcomes[0].rollback, kitchen_rollback());
    assert_eq!(outbound.commands(), kitchen_rollback());
    assert_eq!(backend.cancels.load(Ordering::SeqCst), 1);

    let last = outbound.last_status();
    assert_eq!(last.status, PlanExecStatus::Aborted);
    assert!(last.reason.is_some());
}

#[tokio::test(start_paused = true)]
async fn given_context_check_disabled_when_fuel_is_lost_then_plan_keeps_running() {
    let config = DirectorConfig {
        check_context: false,
        ..config()
    };
    let (mut director, _) = ready_director(config, Arc::new(InstrumentedBackend::new())).await;
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &initial_beliefs())
        .await;

    advance_secs(2).await;
    let outcomes = director.tick(&without_fuel()).await;

    assert!(outcomes.is_empty());
    assert_eq!(director.state(), DirectorState::Executing);
}

#[tokio::test(start_paused = true)]
async fn given_abort_request_when_next_tick_runs_then_plan_is_aborted_with_rollback() {
    let (mut director, outbound) =
        ready_director(config(), Arc::new(InstrumentedBackend::new())).await;
    let beliefs = initial_beliefs();
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &beliefs)
        .await;
    advance_secs(6).await;
    director.tick(&beliefs).await;

    let response = director.handle_request(PlanRequest::abort(), &beliefs).await;
    assert!(response.accepted);
    assert_eq!(director.state(), DirectorState::Executing);

    let outcomes = director.tick(&beliefs).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].cause, Some(DirectorErrorKind::ForcedAbort));
    assert_eq!(outcomes[0].rollback, kitchen_rollback());
    assert_eq!(outbound.last_status().status, PlanExecStatus::Aborted);
    assert_eq!(director.state(), DirectorState::Ready);
}

#[tokio::test(start_paused = true)]
async fn given_backend_reports_failure_when_ticking_then_plan_fails_without_rollback() {
    let backend = Arc::new(InstrumentedBackend::new());
    backend.inner.fail_action("clean").await;
    let (mut director, outbound) = ready_director(config(), backend.clone()).await;
    let beliefs = initial_beliefs();
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &beliefs)
        .await;

    advance_secs(11).await;
    let outcomes = director.tick(&beliefs).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, PlanExecStatus::Failed);
    assert_eq!(outcomes[0].cause, None);
    assert!(outcomes[0].rollback.is_empty());
    assert!(outbound.commands().is_empty());
    assert_eq!(director.state(), DirectorState::Ready);
}

#[tokio::test(start_paused = true)]
async fn given_deadline_factor_when_reported_time_overruns_then_plan_is_aborted() {
    let backend = Arc::new(InstrumentedBackend::new());
    let config = DirectorConfig {
        deadline_abort_factor: Some(1.5),
        ..config()
    };
    let (mut director, _) = ready_director(config, backend.clone()).await;
    let beliefs = initial_beliefs();
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &beliefs)
        .await;
    let plan = director.current_plan().expect("plan installed").clone();

    backend.script_feedback(running_feedback(&plan, 14.0));
    assert!(director.tick(&beliefs).await.is_empty());

    backend.script_feedback(running_feedback(&plan, 16.0));
    let outcomes = director.tick(&beliefs).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].cause, Some(DirectorErrorKind::DeadlineExceeded));
    assert_eq!(director.state(), DirectorState::Ready);
}

#[tokio::test(start_paused = true)]
async fn given_let_finish_policy_when_context_breaks_near_the_end_then_plan_completes_and_abort_is_refused() {
    let config = DirectorConfig {
        almost_complete_policy: AlmostCompleteMode::LetFinish,
        almost_complete_threshold: 0.5,
        ..config()
    };
    let (mut director, outbound) =
        ready_director(config, Arc::new(InstrumentedBackend::new())).await;
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &initial_beliefs())
        .await;
    advance_secs(6).await;
    director.tick(&initial_beliefs()).await;

    assert!(director.tick(&without_fuel()).await.is_empty());
    assert_eq!(director.state(), DirectorState::Executing);

    let response = director
        .handle_request(PlanRequest::abort(), &without_fuel())
        .await;
    assert!(!response.accepted);
    assert_eq!(response.error_kind, Some(DirectorErrorKind::RejectedRequest));
    assert!(director.tick(&without_fuel()).await.is_empty());

    advance_secs(5).await;
    let outcomes = director.tick(&without_fuel()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, PlanExecStatus::Success);
    assert!(outbound.commands().is_empty());
    assert_eq!(director.state(), DirectorState::Ready);
}

#[tokio::test(start_paused = true)]
async fn given_let_finish_policy_when_context_breaks_early_then_plan_is_aborted() {
    let config = DirectorConfig {
        almost_complete_policy: AlmostCompleteMode::LetFinish,
        almost_complete_threshold: 0.75,
        ..config()
    };
    let (mut director, _) = ready_director(config, Arc::new(InstrumentedBackend::new())).await;
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &initial_beliefs())
        .await;
    advance_secs(6).await;

    let outcomes = director.tick(&without_fuel()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].cause, Some(DirectorErrorKind::ContextViolation));
    assert_eq!(director.state(), DirectorState::Ready);
}

#[tokio::test(start_paused = true)]
async fn given_let_finish_policy_when_running_action_is_nearly_done_then_partial_progress_counts() {
    let config = DirectorConfig {
        almost_complete_policy: AlmostCompleteMode::LetFinish,
        almost_complete_threshold: 0.75,
        ..config()
    };
    let (mut director, outbound) =
        ready_director(config, Arc::new(InstrumentedBackend::new())).await;
    director
        .handle_request(PlanRequest::execute(kitchen_body()), &initial_beliefs())
        .await;
    tokio::time::advance(Duration::from_millis(9500)).await;

    assert!(director.tick(&without_fuel()).await.is_empty());
    let plan = director.current_plan().expect("kitchen plan still executing");
    assert!(plan.success_ratio() < 0.75);
    assert!(plan.progress() >= 0.75);
    assert_eq!(director.state(), DirectorState::Executing);

    advance_secs(1).await;
    let outcomes = director.tick(&without_fuel()).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, PlanExecStatus::Success);
    assert!(outbound.commands().is_empty());
}
