//! Read-only comparison of a live database against a plan.

use std::fmt;

use appinspect_kernel::{IndexSpec, ProvisioningPlan, RoleGrant};

use crate::backend::AdminBackend;
use crate::error::ProvisionError;

const SYSTEM_PREFIX: &str = "system.";

#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    MissingCollection {
        name: String,
    },
    UnexpectedCollection {
        name: String,
    },
    MissingIndex {
        collection: String,
        index: IndexSpec,
    },
    UnexpectedIndex {
        collection: String,
        name: String,
    },
    UniqueIndex {
        collection: String,
        name: String,
    },
    MissingUser {
        name: String,
    },
    RoleMismatch {
        user: String,
        expected: Vec<RoleGrant>,
        actual: Vec<RoleGrant>,
    },
}

fn grants(roles: &[RoleGrant]) -> String {
    roles
        .iter()
        .map(|grant| format!("{}@{}", grant.role, grant.db))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingCollection { name } => write!(f, "collection {name} is missing"),
            Finding::UnexpectedCollection { name } => {
                write!(f, "collection {name} is not part of the plan")
            }
            Finding::MissingIndex { collection, index } => {
                write!(f, "index {index} on {collection} is missing")
            }
            Finding::UnexpectedIndex { collection, name } => {
                write!(f, "index {name} on {collection} is not part of the plan")
            }
            Finding::UniqueIndex { collection, name } => {
                write!(f, "index {name} on {collection} is unique")
            }
            Finding::MissingUser { name } => write!(f, "user {name} is missing"),
            Finding::RoleMismatch {
                user,
                expected,
                actual,
            } => write!(
                f,
                "user {user} has roles [{}], expected [{}]",
                grants(actual),
                grants(expected)
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub database: String,
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check that the server holds exactly what `plan` would create.
pub async fn verify<B>(
    backend: &B,
    plan: &ProvisioningPlan,
) -> Result<VerificationReport, ProvisionError>
where
    B: AdminBackend + ?Sized,
{
    backend.ping().await?;
    plan.warn_on_role_db_mismatch();

    let mut report = VerificationReport {
        database: plan.database.clone(),
        findings: Vec::new(),
    };

    let planned = plan.collections();
    let actual: Vec<String> = backend
        .collection_names()
        .await?
        .into_iter()
        .filter(|name| !name.starts_with(SYSTEM_PREFIX))
        .collect();

    for name in &actual {
        if !planned.contains(&name.as_str()) {
            report.findings.push(Finding::UnexpectedCollection { name: name.clone() });
        }
    }

    for collection in planned {
        if !actual.iter().any(|name| name == collection) {
            report.findings.push(Finding::MissingCollection {
                name: collection.to_string(),
            });
            continue;
        }

        let expected = plan.indexes_for(collection);
        let secondary: Vec<_> = backend
            .list_indexes(collection)
            .await?
            .into_iter()
            .filter(|info| !info.is_primary())
            .collect();

        for index in &expected {
            if !secondary.iter().any(|info| info.matches(index)) {
                report.findings.push(Finding::MissingIndex {
                    collection: collection.to_string(),
                    index: (*index).clone(),
                });
            }
        }

        for info in &secondary {
            if !expected.iter().any(|index| info.matches(index)) {
                report.findings.push(Finding::UnexpectedIndex {
                    collection: collection.to_string(),
                    name: info.name.clone(),
                });
            }
            if info.unique {
                report.findings.push(Finding::UniqueIndex {
                    collection: collection.to_string(),
                    name: info.name.clone(),
                });
            }
        }
    }

    if let Some(user) = plan.user() {
        match backend.find_user(&user.name).await? {
            None => report.findings.push(Finding::MissingUser {
                name: user.name.clone(),
            }),
            Some(found) if found.roles != user.roles => {
                report.findings.push(Finding::RoleMismatch {
                    user: user.name.clone(),
                    expected: user.roles.clone(),
                    actual: found.roles,
                });
            }
            Some(_) => {}
        }
    }

    for finding in &report.findings {
        tracing::warn!(target: "appinspect-db", database = %report.database, "{finding}");
    }
    tracing::info!(
        target: "appinspect-db",
        database = %report.database,
        findings = report.findings.len(),
        "verification complete"
    );

    Ok(report)
}
