use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use appinspect_db::ProvisionError;
use appinspect_kernel::settings::{ConflictPolicy, Environment, Settings};
use appinspect_provision::bootstrap;

#[derive(Debug, Parser)]
#[command(name = "appinspect", version, about = "Provision the AppInspect database")]
struct Cli {
    /// Configuration overlay to load; overrides APPINSPECT_ENV
    #[arg(long, global = true, value_enum)]
    env: Option<EnvArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the provisioning steps without connecting
    Plan {
        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the user, collections and indexes
    Provision {
        /// What to do when a resource already exists
        #[arg(long, value_enum)]
        on_conflict: Option<PolicyArg>,
    },
    /// Compare the live database with the plan
    Verify,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnvArg {
    Local,
    Staging,
    Production,
}

impl From<EnvArg> for Environment {
    fn from(value: EnvArg) -> Self {
        match value {
            EnvArg::Local => Environment::Local,
            EnvArg::Staging => Environment::Staging,
            EnvArg::Production => Environment::Production,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Fail,
}

impl From<PolicyArg> for ConflictPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Skip => ConflictPolicy::Skip,
            PolicyArg::Fail => ConflictPolicy::Fail,
        }
    }
}

/// Exit status when the server cannot be reached or refuses the credential.
const EXIT_UNREACHABLE: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.env.map(Environment::from))
        .with_context(|| "failed to load AppInspect settings")?;
    appinspect_telemetry::init(&settings.telemetry);

    tracing::debug!(env = ?settings.environment, command = ?cli.command, "appinspect cli");

    match run(cli.command, &settings).await {
        Err(err) if is_unreachable(&err) => {
            tracing::error!(error = %err, "database server unreachable");
            eprintln!("error: cannot reach the database server: {err:#}");
            Ok(ExitCode::from(EXIT_UNREACHABLE))
        }
        other => other,
    }
}

fn is_unreachable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ProvisionError>())
        .any(ProvisionError::is_fatal_connection)
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<ExitCode> {
    match command {
        Command::Plan { json } => {
            let plan = bootstrap::build_plan(settings)?;
            plan.warn_on_role_db_mismatch();
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{plan}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Provision { on_conflict } => {
            let policy = on_conflict
                .map(ConflictPolicy::from)
                .unwrap_or(settings.provisioning.on_conflict);
            let report = bootstrap::run_provision(settings, policy).await?;
            for outcome in &report.outcomes {
                println!("{:>2}. {} ({})", outcome.ordinal, outcome.description, outcome.status);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify => {
            let report = bootstrap::run_verify(settings).await?;
            if report.is_clean() {
                println!("{}: ok", report.database);
                return Ok(ExitCode::SUCCESS);
            }
            for finding in &report.findings {
                println!("{}: {finding}", report.database);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
