//! Settings in, plan out, plan applied.

use anyhow::Context;
use tracing::Instrument;
use uuid::Uuid;

use appinspect_db::{MongoBackend, ProvisionReport, VerificationReport};
use appinspect_kernel::{ConflictPolicy, ModuleRegistry, ProvisioningPlan, Settings};

use crate::modules;

/// Registry with every collection module registered.
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let names: Vec<&str> = registry.modules().iter().map(|module| module.name()).collect();
    tracing::debug!(modules = ?names, "collection modules registered");
    registry
}

pub fn build_plan(settings: &Settings) -> anyhow::Result<ProvisioningPlan> {
    ProvisioningPlan::build(settings, &build_registry()).context("failed to build provisioning plan")
}

/// Connect with the administrative credential and apply the plan once.
pub async fn run_provision(
    settings: &Settings,
    policy: ConflictPolicy,
) -> anyhow::Result<ProvisionReport> {
    let span = tracing::info_span!(
        "provision",
        run_id = %Uuid::now_v7(),
        env = settings.environment.as_str(),
    );

    async {
        let plan = build_plan(settings)?;
        let backend = MongoBackend::connect(&settings.database)
            .await
            .context("failed to connect to the database server")?;

        let result = appinspect_db::provision(&backend, &plan, policy).await;
        backend.shutdown().await;

        result.context("provisioning aborted")
    }
    .instrument(span)
    .await
}

/// Compare the live database against the plan without changing it.
pub async fn run_verify(settings: &Settings) -> anyhow::Result<VerificationReport> {
    let span = tracing::info_span!(
        "verify",
        run_id = %Uuid::now_v7(),
        env = settings.environment.as_str(),
    );

    async {
        let plan = build_plan(settings)?;
        let backend = MongoBackend::connect(&settings.database)
            .await
            .context("failed to connect to the database server")?;

        let result = appinspect_db::verify(&backend, &plan).await;
        backend.shutdown().await;

        result.context("verification aborted")
    }
    .instrument(span)
    .await
}
