//! MongoDB client factory and provisioning tooling.

pub mod backend;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod mongo;
pub mod provision;
pub mod verify;

pub use backend::{AdminBackend, IndexInfo, UserInfo};
pub use error::{ProvisionError, ResourceKind};
pub use mongo::MongoBackend;
pub use provision::{provision, ProvisionReport, StepOutcome, StepStatus};
pub use verify::{verify, Finding, VerificationReport};
