#[allow(clippy::module_inception)]
pub mod director;
pub mod error;
pub mod policy;
pub mod ports;
pub mod readiness;
pub mod reliability;
pub mod types;

pub use director::PlanDirector;
pub use error::{DirectorError, DirectorErrorKind};
pub use policy::{
    AlmostCompleteMode, AlmostCompletePolicy, AlwaysAbort, LetFinishWhenAlmostComplete,
    ReschedulePolicy,
};
pub use ports::OutboundPort;
pub use readiness::{PeerStatus, ReadinessTracker};
pub use types::{
    DirectorState, PlanBody, PlanOutcome, PlanRequest, PlanRequestKind, PlanResponse,
    PlanStatusReport,
};
