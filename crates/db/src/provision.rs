//! Applies a [`ProvisioningPlan`] one step at a time.

use std::fmt;

use appinspect_kernel::{ConflictPolicy, IndexSpec, ProvisioningPlan, RoleGrant, Step, UserSpec};

use crate::backend::AdminBackend;
use crate::error::{ProvisionError, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Selected,
    Created,
    Skipped,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepStatus::Selected => "selected",
            StepStatus::Created => "created",
            StepStatus::Skipped => "skipped",
        })
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub ordinal: usize,
    pub description: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub outcomes: Vec<StepOutcome>,
}

impl ProvisionReport {
    pub fn count(&self, status: StepStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    /// True when the run changed nothing on the server.
    pub fn is_no_op(&self) -> bool {
        self.count(StepStatus::Created) == 0
    }
}

/// Run every step of `plan` in order, stopping at the first failure.
///
/// Each create step looks for its resource first; `policy` decides whether
/// an existing one is skipped or aborts the run.
pub async fn provision<B>(
    backend: &B,
    plan: &ProvisioningPlan,
    policy: ConflictPolicy,
) -> Result<ProvisionReport, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    plan.warn_on_role_db_mismatch();

    tracing::info!(
        target: "appinspect-db",
        database = %plan.database,
        steps = plan.steps.len(),
        policy = ?policy,
        "provisioning started"
    );

    let mut report = ProvisionReport::default();

    for planned in &plan.steps {
        let description = planned.step.to_string();

        let status = run_step(backend, &planned.step, policy)
            .await
            .map_err(|source| {
                tracing::error!(
                    target: "appinspect-db",
                    ordinal = planned.ordinal,
                    step = %description,
                    error = %source,
                    "provisioning step failed"
                );
                ProvisionError::Step {
                    ordinal: planned.ordinal,
                    description: description.clone(),
                    source: Box::new(source),
                }
            })?;

        tracing::info!(
            target: "appinspect-db",
            ordinal = planned.ordinal,
            step = %description,
            status = %status,
            "provisioning step done"
        );

        report.outcomes.push(StepOutcome {
            ordinal: planned.ordinal,
            description,
            status,
        });
    }

    tracing::info!(
        target: "appinspect-db",
        created = report.count(StepStatus::Created),
        skipped = report.count(StepStatus::Skipped),
        "provisioning complete"
    );

    Ok(report)
}

async fn run_step<B>(
    backend: &B,
    step: &Step,
    policy: ConflictPolicy,
) -> Result<StepStatus, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    match step {
        Step::SelectDatabase { name } => select_database(backend, name).await,
        Step::CreateUser { user } => create_user(backend, user, policy).await,
        Step::CreateCollection { name } => create_collection(backend, name, policy).await,
        Step::CreateIndex { collection, index } => {
            create_index(backend, collection, index, policy).await
        }
    }
}

async fn select_database<B>(backend: &B, name: &str) -> Result<StepStatus, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    if backend.database() != name {
        return Err(ProvisionError::Backend(format!(
            "backend is bound to database '{}', plan targets '{name}'",
            backend.database()
        )));
    }
    backend.ping().await?;
    Ok(StepStatus::Selected)
}

async fn create_user<B>(
    backend: &B,
    user: &UserSpec,
    policy: ConflictPolicy,
) -> Result<StepStatus, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    if let Some(found) = backend.find_user(&user.name).await? {
        if found.roles != user.roles {
            return Err(ProvisionError::conflicting(
                ResourceKind::User,
                &user.name,
                format!(
                    "granted [{}], plan grants [{}]",
                    grants(&found.roles),
                    grants(&user.roles)
                ),
            ));
        }
        return on_conflict(policy, ResourceKind::User, &user.name);
    }

    let password = user
        .password
        .as_ref()
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ProvisionError::MissingPassword {
            user: user.name.clone(),
        })?;

    backend.create_user(user, password).await?;
    Ok(StepStatus::Created)
}

async fn create_collection<B>(
    backend: &B,
    name: &str,
    policy: ConflictPolicy,
) -> Result<StepStatus, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    let existing = backend.collection_names().await?;
    if existing.iter().any(|collection| collection == name) {
        return on_conflict(policy, ResourceKind::Collection, name);
    }

    backend.create_collection(name).await?;
    Ok(StepStatus::Created)
}

async fn create_index<B>(
    backend: &B,
    collection: &str,
    index: &IndexSpec,
    policy: ConflictPolicy,
) -> Result<StepStatus, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    let existing = backend.list_indexes(collection).await?;
    if let Some(found) = existing.iter().find(|info| info.matches(index)) {
        let name = format!("{collection}.{}", index.default_name());
        if found.unique {
            return Err(ProvisionError::conflicting(
                ResourceKind::Index,
                name,
                format!("existing index '{}' is unique", found.name),
            ));
        }
        return on_conflict(policy, ResourceKind::Index, &name);
    }

    backend.create_index(collection, index).await?;
    Ok(StepStatus::Created)
}

fn grants(roles: &[RoleGrant]) -> String {
    roles
        .iter()
        .map(|grant| format!("{}@{}", grant.role, grant.db))
        .collect::<Vec<_>>()
        .join(", ")
}

fn on_conflict(
    policy: ConflictPolicy,
    kind: ResourceKind,
    name: &str,
) -> Result<StepStatus, ProvisionError> {
    match policy {
        ConflictPolicy::Skip => {
            tracing::debug!(target: "appinspect-db", %kind, resource = name, "already present, skipping");
            Ok(StepStatus::Skipped)
        }
        ConflictPolicy::Fail => Err(ProvisionError::already_exists(kind, name)),
    }
}
