pub mod engine;
pub mod error;
pub mod loader;
pub mod types;

pub use engine::ReactiveRuleEngine;
pub use error::{RuleError, RuleErrorKind};
pub use loader::{load_rules, validate_rule};
pub use types::{ReactiveRule, RuleEffect};
