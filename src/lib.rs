//! AppInspect database provisioning
//!
//! Collection modules plus the glue that turns settings into a plan and
//! applies or verifies it against a MongoDB server.

pub mod bootstrap;
pub mod modules;
