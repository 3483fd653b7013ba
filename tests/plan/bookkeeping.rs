use volition::plan::{ActionStatus, ManagedPlan, PlanExecStatus, PlanItem};

use crate::{feedback, observed, target, three_step_plan};

#[test]
fn given_unsorted_items_when_creating_plan_then_actions_follow_planned_start() {
    let plan = ManagedPlan::new(
        target(),
        vec![
            PlanItem::new("clean", &["robot1", "kitchen"], 5.0, 5.0),
            PlanItem::new("move", &["robot1", "dock1", "kitchen"], 0.0, 5.0),
        ],
    );

    let starts: Vec<f64> = plan.actions().iter().map(|action| action.planned_start).collect();
    assert_eq!(starts, vec![0.0, 5.0]);
    assert!(plan.planned_deadline() >= 10.0);
    assert_eq!(plan.exec_status(), PlanExecStatus::Idle);
}

#[test]
fn given_committed_flags_when_feedback_reorders_actions_then_flags_are_kept_by_key() {
    let mut plan = three_step_plan();
    assert!(plan.set_action_committed("(move robot1 dock1 kitchen)", 0.0, true));
    assert!(plan.set_action_committed("(clean robot1 kitchen)", 5.0, true));
    let before: Vec<(String, bool)> = plan
        .actions()
        .iter()
        .map(|action| (action.full_name(), action.committed))
        .collect();

    let actions = plan.actions().to_vec();
    let mut refreshed = vec![
        observed(&actions[2], ActionStatus::Unknown, None, None),
        observed(&actions[0], ActionStatus::Success, Some(0.0), Some(5.0)),
        observed(&actions[1], ActionStatus::Running, Some(5.0), None),
    ];
    // Sub-millisecond jitter on the echoed start time still matches.
    refreshed[2].planned_start += 0.0002;
    plan.apply_feedback(&feedback(6.0, refreshed));

    let after: Vec<(String, bool)> = plan
        .actions()
        .iter()
        .map(|action| (action.full_name(), action.committed))
        .collect();
    assert_eq!(after, before);
    assert_eq!(plan.actions()[0].status, ActionStatus::Success);
}

#[test]
fn given_same_action_twice_when_committing_one_occurrence_then_only_that_start_matches() {
    let mut plan = three_step_plan();

    assert!(plan.set_action_committed("( move  robot1 kitchen dock1 )", 10.0, true));
    assert!(!plan.set_action_committed("(move robot1 kitchen dock1)", 0.0, true));

    let committed: Vec<bool> = plan.actions().iter().map(|action| action.committed).collect();
    assert_eq!(committed, vec![false, false, true]);
}

#[test]
fn given_identical_snapshot_when_applied_twice_then_plan_state_is_identical() {
    let mut plan = three_step_plan();
    plan.set_committed_all(true);
    let actions = plan.actions().to_vec();
    let snapshot = feedback(
        7.0,
        vec![
            observed(&actions[0], ActionStatus::Success, Some(0.0), Some(6.0)),
            observed(&actions[1], ActionStatus::Running, Some(6.0), None),
            observed(&actions[2], ActionStatus::Unknown, None, None),
        ],
    );

    plan.apply_feedback(&snapshot);
    let once = plan.clone();
    plan.apply_feedback(&snapshot);

    assert_eq!(plan, once);
    assert_eq!(plan.last_reported_time(), 7.0);
    assert!(plan.actions().iter().all(|action| action.committed));
}

#[test]
fn given_terminal_feedback_when_applied_then_plan_status_follows_backend() {
    let mut plan = three_step_plan();
    let actions = plan.actions().to_vec();
    let mut snapshot = feedback(
        15.0,
        actions
            .iter()
            .map(|action| {
                observed(
                    action,
                    ActionStatus::Success,
                    Some(action.planned_start),
                    Some(action.planned_end()),
                )
            })
            .collect(),
    );
    snapshot.status = PlanExecStatus::Success;

    plan.apply_feedback(&snapshot);

    assert_eq!(plan.exec_status(), PlanExecStatus::Success);
    assert_eq!(plan.success_ratio(), 1.0);
    assert!(plan.remaining().is_none());
}

#[test]
fn given_partly_done_plan_when_taking_remaining_then_tail_is_rebased_and_keeps_commitment() {
    let mut plan = three_step_plan().with_queue_index(Some(2));
    plan.set_action_committed("(move robot1 kitchen dock1)", 10.0, true);
    let actions = plan.actions().to_vec();
    plan.apply_feedback(&feedback(
        7.0,
        vec![
            observed(&actions[0], ActionStatus::Success, Some(0.0), Some(5.0)),
            observed(&actions[1], ActionStatus::Running, Some(5.0), None),
            observed(&actions[2], ActionStatus::Unknown, None, None),
        ],
    ));

    let remaining = plan.remaining().expect("two actions are left");

    assert_eq!(remaining.plan_id(), plan.plan_id());
    assert_eq!(remaining.queue_index(), Some(2));
    let items = remaining.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "clean");
    assert_eq!(items[0].planned_start, 0.0);
    assert_eq!(items[1].planned_start, 5.0);
    assert!(items[1].committed);
    assert!(
        remaining
            .actions()
            .iter()
            .all(|action| action.status == ActionStatus::Unknown)
    );
}

#[test]
fn given_commitment_when_exporting_status_then_items_carry_flags_and_queue_index() {
    let mut plan = three_step_plan().with_queue_index(Some(4));
    plan.set_action_committed("(clean robot1 kitchen)", 5.0, true);

    let status = plan.committed_status();

    assert_eq!(status.queue_index, Some(4));
    let flags: Vec<bool> = status.items.iter().map(|item| item.committed).collect();
    assert_eq!(flags, vec![false, true, false]);
}

#[test]
fn given_running_progress_when_measuring_then_success_ratio_ignores_partial_work() {
    let mut plan = three_step_plan();
    let actions = plan.actions().to_vec();
    let mut running = observed(&actions[1], ActionStatus::Running, Some(5.0), None);
    running.progress = 0.5;
    plan.apply_feedback(&feedback(
        7.5,
        vec![
            observed(&actions[0], ActionStatus::Success, Some(0.0), Some(5.0)),
            running,
            observed(&actions[2], ActionStatus::Unknown, None, None),
        ],
    ));

    assert!((plan.progress() - 0.5).abs() < 1e-9);
    assert!((plan.success_ratio() - 1.0 / 3.0).abs() < 1e-9);
}
