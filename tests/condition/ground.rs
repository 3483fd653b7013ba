use volition::condition::{Binding, ConditionDnf, ConditionEvaluator, Conjunction};

use crate::{pred, world};

#[test]
fn given_ground_conjunction_when_clauses_reordered_then_result_is_unchanged() {
    let beliefs = world();
    let clauses = vec![
        pred("in", &["robot1", "kitchen"]),
        pred("hasFuel", &["robot1"]),
        pred("dirty", &["kitchen"]),
    ];

    let mut reversed = clauses.clone();
    reversed.reverse();
    let mut rotated = clauses.clone();
    rotated.rotate_left(1);

    for ordering in [clauses, reversed, rotated] {
        let dnf = ConditionDnf::single(ordering);
        assert!(ConditionEvaluator::is_satisfied(&dnf, &beliefs));
        assert_eq!(
            ConditionEvaluator::evaluate(&dnf, &beliefs).into_iter().collect::<Vec<_>>(),
            vec![Binding::new()]
        );
    }
}

#[test]
fn given_one_false_clause_when_evaluating_ground_conjunction_then_unsatisfied() {
    let beliefs = world();
    let dnf = ConditionDnf::single(vec![
        pred("hasFuel", &["robot1"]),
        pred("hasFuel", &["robot2"]),
    ]);

    assert!(!ConditionEvaluator::is_satisfied(&dnf, &beliefs));
    assert!(ConditionEvaluator::evaluate(&dnf, &beliefs).is_empty());
}

#[test]
fn given_disjunction_when_any_conjunction_holds_then_satisfied() {
    let beliefs = world();
    let dnf = ConditionDnf::new(vec![
        Conjunction::new(vec![pred("hasFuel", &["robot2"])]),
        Conjunction::new(vec![pred("dirty", &["hall"])]),
    ]);

    assert!(ConditionEvaluator::is_satisfied(&dnf, &beliefs));
    assert_eq!(ConditionEvaluator::evaluate(&dnf, &beliefs).len(), 1);
}

#[test]
fn given_negated_ground_clause_when_fact_present_then_unsatisfied() {
    let beliefs = world();
    let holds = ConditionDnf::single(vec![pred("hasFuel", &["robot2"]).negate()]);
    let fails = ConditionDnf::single(vec![pred("hasFuel", &["robot1"]).negate()]);

    assert!(ConditionEvaluator::is_satisfied(&holds, &beliefs));
    assert!(!ConditionEvaluator::is_satisfied(&fails, &beliefs));
}

#[test]
fn given_no_conjunctions_when_evaluating_then_condition_is_trivially_satisfied() {
    let beliefs = world();
    let empty = ConditionDnf::default();

    assert!(ConditionEvaluator::is_satisfied(&empty, &beliefs));
    assert_eq!(ConditionEvaluator::evaluate(&empty, &beliefs).len(), 1);
}

#[test]
fn given_predicate_with_wrong_arity_when_matching_then_no_fact_matches() {
    let beliefs = world();
    let dnf = ConditionDnf::single(vec![pred("in", &["robot1"])]);

    assert!(!ConditionEvaluator::is_satisfied(&dnf, &beliefs));
}
