pub mod store;
pub mod types;

pub use store::BeliefStore;
pub use types::{Belief, BeliefKey, BeliefKind, BeliefUpdate};
