use std::fs;

use volition::{
    belief::{Belief, BeliefStore},
    condition::{Clause, ConditionDnf, Term},
    reactive::{ReactiveRuleEngine, RuleErrorKind, load_rules, validate_rule},
    types::OutboundCommand,
};

use crate::{add_belief, demo_rules_path, dirty_room_trigger, rule, write_rules};

#[test]
fn given_demo_rule_file_when_loading_then_rules_parse_and_fire() {
    let rules = load_rules(&demo_rules_path()).expect("demo rules should load");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].name, "clean_dirty_rooms");

    let engine = ReactiveRuleEngine::new(rules);
    let beliefs = BeliefStore::from_beliefs([
        Belief::predicate("dirty", &["kitchen"]),
        Belief::fluent("battery", &["robot1"], 15.0),
    ]);
    let kinds: Vec<&str> = engine
        .on_belief_update(&beliefs)
        .iter()
        .map(OutboundCommand::kind_name)
        .collect();

    assert_eq!(kinds, vec!["add_desire", "del_belief", "boost_desire"]);
}

#[test]
fn given_json5_rules_with_comments_when_loading_then_placeholders_are_parsed() {
    let path = write_rules(
        r#"[
          // tag dirty rooms
          {
            name: "tag",
            trigger: [[{ name: "dirty", params: ["{room}"] }]],
            effects: [{ type: "add_belief", belief: { name: "tagged", params: ["{room}"] } }],
          },
        ]"#,
    );

    let rules = load_rules(&path).expect("rules should load");

    assert_eq!(rules[0].trigger, dirty_room_trigger());
    let _ = fs::remove_file(&path);
}

#[test]
fn given_rule_with_unbound_effect_placeholder_when_loading_then_error_names_rule_index() {
    let path = write_rules(
        r#"[
          {
            name: "ok",
            trigger: [[{ name: "dirty", params: ["{room}"] }]],
            effects: [{ type: "add_belief", belief: { name: "tagged", params: ["{room}"] } }],
          },
          {
            name: "broken",
            trigger: [[{ name: "dirty", params: ["{room}"] }]],
            effects: [{ type: "add_belief", belief: { name: "owner", params: ["{robot}"] } }],
          },
        ]"#,
    );

    let err = load_rules(&path).expect_err("unbound placeholder must be rejected");
    let message = format!("{err:#}");

    assert!(message.contains("rule #1"), "unexpected error: {message}");
    assert!(message.contains("{robot}"), "unexpected error: {message}");
    let _ = fs::remove_file(&path);
}

#[test]
fn given_malformed_rule_file_when_loading_then_parse_error_is_reported() {
    let path = write_rules("[{ name: 'x', trigger: ");

    let err = load_rules(&path).expect_err("malformed file must fail");

    assert!(err.to_string().contains("failed to parse reactive rules"));
    let _ = fs::remove_file(&path);
}

#[test]
fn given_empty_trigger_when_validating_then_rule_is_rejected() {
    let err = validate_rule(
        3,
        &rule(
            "empty",
            ConditionDnf::default(),
            vec![add_belief("x", vec![Term::value("a")])],
        ),
    )
    .expect_err("empty trigger must be rejected");

    assert_eq!(err.kind, RuleErrorKind::EmptyTrigger);
    assert_eq!(err.rule_index, 3);
}

#[test]
fn given_placeholder_bound_only_by_negated_clause_when_validating_then_rule_is_rejected() {
    let trigger = ConditionDnf::single(vec![
        Clause::predicate("dirty", vec![Term::placeholder("room")]),
        Clause::predicate("busy", vec![Term::placeholder("r")]).negate(),
    ]);

    let err = validate_rule(
        0,
        &rule("neg", trigger, vec![add_belief("assign", vec![Term::placeholder("r")])]),
    )
    .expect_err("negation does not bind");

    assert_eq!(err.kind, RuleErrorKind::UnboundPlaceholder);
}

#[test]
fn given_rule_without_effects_when_validating_then_rule_is_rejected() {
    let err = validate_rule(0, &rule("noop", dirty_room_trigger(), Vec::new()))
        .expect_err("rule without effects must be rejected");

    assert_eq!(err.kind, RuleErrorKind::InvalidEffect);
}
