//! Settings, schema declarations, and the provisioning plan.

pub mod module;
pub mod plan;
pub mod registry;
pub mod schema;
pub mod settings;

pub use module::{Migration, Module, SchemaStep};
pub use plan::{PlannedStep, ProvisioningPlan, Step};
pub use registry::ModuleRegistry;
pub use schema::{IndexField, IndexSpec, RoleGrant, SortOrder, UserSpec};
pub use settings::{ConflictPolicy, Environment, Secret, Settings};
