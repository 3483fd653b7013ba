pub mod error;
pub mod ports;
pub mod simulated;

pub use crate::domain::{ActionDefinition, ActionEffect, DomainDefinition, TypedParameter};
pub use error::{BackendError, BackendErrorKind};
pub use ports::ExecutionBackend;
pub use simulated::SimulatedBackend;
