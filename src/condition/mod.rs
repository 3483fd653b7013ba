pub mod evaluator;
pub mod types;

pub use evaluator::ConditionEvaluator;
pub use types::{
    BeliefTemplate, Binding, Clause, Comparator, Comparison, ConditionDnf, Conjunction, FLUENT_EPSILON, Term,
};
