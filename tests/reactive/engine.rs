use volition::{
    belief::{Belief, BeliefStore},
    condition::{BeliefTemplate, Clause, Comparator, ConditionDnf, Term},
    desire::Desire,
    reactive::{ReactiveRuleEngine, RuleEffect},
    types::OutboundCommand,
};

use crate::{add_belief, dirty_room_trigger, rule};

fn dirty(rooms: &[&str]) -> BeliefStore {
    BeliefStore::from_beliefs(
        rooms
            .iter()
            .map(|room| Belief::predicate("dirty", &[*room])),
    )
}

#[test]
fn given_no_rules_when_building_engine_then_it_is_idle() {
    let engine = ReactiveRuleEngine::new(Vec::new());

    assert!(engine.is_idle());
    assert!(engine.on_belief_update(&dirty(&["kitchen"])).is_empty());
}

#[test]
fn given_two_bindings_when_rule_fires_then_effects_run_once_per_binding() {
    let engine = ReactiveRuleEngine::new(vec![rule(
        "mark",
        dirty_room_trigger(),
        vec![add_belief("needsCleaning", vec![Term::placeholder("room")])],
    )]);

    let commands = engine.on_belief_update(&dirty(&["kitchen", "hall"]));

    assert_eq!(
        commands,
        vec![
            OutboundCommand::AddBelief {
                belief: Belief::predicate("needsCleaning", &["hall"])
            },
            OutboundCommand::AddBelief {
                belief: Belief::predicate("needsCleaning", &["kitchen"])
            },
        ]
    );
}

#[test]
fn given_identical_effects_from_different_bindings_when_firing_then_nothing_is_deduplicated() {
    let engine = ReactiveRuleEngine::new(vec![rule(
        "alarm",
        dirty_room_trigger(),
        vec![add_belief("alarm", vec![Term::value("house")])],
    )]);

    let commands = engine.on_belief_update(&dirty(&["kitchen", "hall", "bathroom"]));

    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(|command| command
        == &OutboundCommand::AddBelief {
            belief: Belief::predicate("alarm", &["house"])
        }));
}

#[test]
fn given_effect_list_when_rule_fires_then_effects_keep_declared_order() {
    let target = ConditionDnf::single(vec![Clause::predicate(
        "cleaned",
        vec![Term::placeholder("room")],
    )]);
    let engine = ReactiveRuleEngine::new(vec![rule(
        "clean",
        dirty_room_trigger(),
        vec![
            RuleEffect::AddDesire {
                desire: Desire::new("clean_room", target),
            },
            RuleEffect::DelBelief {
                belief: BeliefTemplate::predicate(
                    "idle",
                    vec![Term::value("robot1")],
                ),
            },
        ],
    )]);

    let commands = engine.on_belief_update(&dirty(&["kitchen"]));

    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].kind_name(), "add_desire");
    assert_eq!(commands[1].kind_name(), "del_belief");
    let OutboundCommand::AddDesire { desire } = &commands[0] else {
        panic!("first command should add a desire");
    };
    assert_eq!(desire.to_pddl_goal(), "(and (cleaned kitchen))");
}

#[test]
fn given_fluent_threshold_when_value_crosses_then_rule_fires_for_that_robot_only() {
    let engine = ReactiveRuleEngine::new(vec![rule(
        "low_battery",
        ConditionDnf::single(vec![Clause::fluent(
            "battery",
            vec![Term::placeholder("r")],
            Comparator::Lt,
            20.0,
        )]),
        vec![RuleEffect::DelBelief {
            belief: BeliefTemplate::predicate(
                "hasFuel",
                vec![Term::placeholder("r")],
            ),
        }],
    )]);
    let beliefs = BeliefStore::from_beliefs([
        Belief::fluent("battery", &["robot1"], 80.0),
        Belief::fluent("battery", &["robot2"], 10.0),
    ]);

    assert_eq!(
        engine.on_belief_update(&beliefs),
        vec![OutboundCommand::DelBelief {
            belief: Belief::predicate("hasFuel", &["robot2"])
        }]
    );
}

#[test]
fn given_placeholder_bound_only_by_negation_when_firing_then_effect_is_skipped() {
    let trigger = ConditionDnf::single(vec![
        Clause::predicate("dirty", vec![Term::placeholder("room")]),
        Clause::predicate("busy", vec![Term::placeholder("r")]).negate(),
    ]);
    let engine = ReactiveRuleEngine::new(vec![rule(
        "unbound",
        trigger,
        vec![
            add_belief("assign", vec![Term::placeholder("r")]),
            add_belief("seen", vec![Term::placeholder("room")]),
        ],
    )]);

    let commands = engine.on_belief_update(&dirty(&["kitchen"]));

    assert_eq!(
        commands,
        vec![OutboundCommand::AddBelief {
            belief: Belief::predicate("seen", &["kitchen"])
        }]
    );
}
