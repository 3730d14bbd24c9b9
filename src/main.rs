use anyhow::Context;
use appinspect_kernel::settings::Settings;
use appinspect_provision::bootstrap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load(None).with_context(|| "failed to load AppInspect settings")?;
    appinspect_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        endpoint = %settings.database.redacted_uri(),
        db = %settings.database.name,
        "appinspect-provision starting"
    );

    let report = bootstrap::run_provision(&settings, settings.provisioning.on_conflict).await?;

    tracing::info!(
        steps = report.outcomes.len(),
        no_op = report.is_no_op(),
        "appinspect-provision complete"
    );
    Ok(())
}
