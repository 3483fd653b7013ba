mod engine;
mod loader;

use std::{fs, path::PathBuf};

use uuid::Uuid;
use volition::{
    condition::{BeliefTemplate, Clause, ConditionDnf, Term},
    reactive::{ReactiveRule, RuleEffect},
};

fn dirty_room_trigger() -> ConditionDnf {
    ConditionDnf::single(vec![Clause::predicate(
        "dirty",
        vec![Term::placeholder("room")],
    )])
}

fn rule(name: &str, trigger: ConditionDnf, effects: Vec<RuleEffect>) -> ReactiveRule {
    ReactiveRule {
        name: name.to_string(),
        trigger,
        effects,
    }
}

fn add_belief(name: &str, params: Vec<Term>) -> RuleEffect {
    RuleEffect::AddBelief {
        belief: BeliefTemplate::predicate(name, params),
    }
}

fn write_rules(content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("volition-rules-test-{}", Uuid::now_v7()));
    fs::create_dir_all(&dir).expect("temp dir should be created");
    let path = dir.join("rules.jsonc");
    fs::write(&path, content).expect("rules file should be written");
    path
}

fn demo_rules_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/cleaning.rules.jsonc")
}
