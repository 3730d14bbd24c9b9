//! The ordered list of administrative steps a provisioning run performs.

use std::collections::HashSet;
use std::fmt;

use anyhow::{bail, Context};
use serde::Serialize;

use crate::module::SchemaStep;
use crate::registry::ModuleRegistry;
use crate::schema::{IndexSpec, RoleGrant, UserSpec};
use crate::settings::Settings;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    SelectDatabase {
        name: String,
    },
    CreateUser {
        #[serde(flatten)]
        user: UserSpec,
    },
    CreateCollection {
        name: String,
    },
    CreateIndex {
        collection: String,
        index: IndexSpec,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::SelectDatabase { name } => write!(f, "select database {name}"),
            Step::CreateUser { user } => write!(f, "create user {user}"),
            Step::CreateCollection { name } => write!(f, "create collection {name}"),
            Step::CreateIndex { collection, index } => {
                write!(f, "create index {index} on {collection}")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub ordinal: usize,
    #[serde(flatten)]
    pub step: Step,
}

impl fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}. {}", self.ordinal, self.step)
    }
}

/// Everything a run needs to know, with no literals left in the code path.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningPlan {
    pub database: String,
    pub steps: Vec<PlannedStep>,
}

impl ProvisioningPlan {
    /// Build the plan from settings (database, user) and module migrations.
    pub fn build(settings: &Settings, registry: &ModuleRegistry) -> anyhow::Result<Self> {
        let database = settings.database.name.trim().to_string();
        if database.is_empty() {
            bail!("database.name must not be empty");
        }
        if settings.app_user.name.trim().is_empty() {
            bail!("app_user.name must not be empty");
        }

        let role_db = settings
            .app_user
            .role_db
            .clone()
            .unwrap_or_else(|| database.clone());

        let mut steps = vec![
            Step::SelectDatabase {
                name: database.clone(),
            },
            Step::CreateUser {
                user: UserSpec {
                    name: settings.app_user.name.clone(),
                    password: settings.app_user.password.clone(),
                    roles: vec![RoleGrant {
                        role: settings.app_user.role.clone(),
                        db: role_db,
                    }],
                },
            },
        ];

        let migrations = registry
            .collect_migrations()
            .context("failed to collect module migrations")?;

        let mut collections = HashSet::new();
        for (owner, migration) in migrations {
            match migration.step {
                SchemaStep::CreateCollection { name } => {
                    if !collections.insert(name) {
                        bail!(
                            "collection '{name}' is created twice (migration '{}' of '{owner}')",
                            migration.id
                        );
                    }
                    steps.push(Step::CreateCollection {
                        name: name.to_string(),
                    });
                }
                SchemaStep::CreateIndex { collection, index } => {
                    if !collections.contains(collection) {
                        bail!(
                            "migration '{}' of '{owner}' indexes '{collection}' before it is created",
                            migration.id
                        );
                    }
                    if index.fields.is_empty() {
                        bail!(
                            "migration '{}' of '{owner}' declares an index without fields",
                            migration.id
                        );
                    }
                    steps.push(Step::CreateIndex {
                        collection: collection.to_string(),
                        index,
                    });
                }
            }
        }

        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(position, step)| PlannedStep {
                ordinal: position + 1,
                step,
            })
            .collect();

        Ok(Self { database, steps })
    }

    pub fn user(&self) -> Option<&UserSpec> {
        self.steps.iter().find_map(|planned| match &planned.step {
            Step::CreateUser { user } => Some(user),
            _ => None,
        })
    }

    pub fn collections(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|planned| match &planned.step {
                Step::CreateCollection { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn indexes_for(&self, collection: &str) -> Vec<&IndexSpec> {
        self.steps
            .iter()
            .filter_map(|planned| match &planned.step {
                Step::CreateIndex {
                    collection: target,
                    index,
                } if target == collection => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Grant databases that differ from the selected database.
    pub fn role_db_mismatch(&self) -> Vec<&str> {
        self.user()
            .map(|user| {
                user.roles
                    .iter()
                    .map(|grant| grant.db.as_str())
                    .filter(|db| *db != self.database)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Log a warning for every grant that targets another database.
    pub fn warn_on_role_db_mismatch(&self) {
        for role_db in self.role_db_mismatch() {
            tracing::warn!(
                database = %self.database,
                role_db = %role_db,
                "role grant targets a different database than the one provisioned; confirm this is intended"
            );
        }
    }
}

impl fmt::Display for ProvisioningPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for planned in &self.steps {
            writeln!(f, "{planned}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::module::{Migration, Module};

    struct Pair;

    impl Module for Pair {
        fn name(&self) -> &'static str {
            "pair"
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration::create_collection("03_collection", "Left"),
                Migration::create_collection("04_collection", "Right"),
                Migration::create_index("05_index", "Right", &["B", "A"]),
                Migration::create_index("06_index", "Left", &["A"]),
            ]
        }
    }

    fn registry_with(module: Arc<dyn Module>) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(module);
        registry
    }

    #[test]
    fn plan_starts_with_database_and_user() {
        let plan = ProvisioningPlan::build(&Settings::default(), &registry_with(Arc::new(Pair)))
            .unwrap();

        assert_eq!(plan.steps.len(), 6);
        assert_eq!(plan.steps[0].to_string(), " 1. select database appinspect_prod");
        assert_eq!(
            plan.steps[1].to_string(),
            " 2. create user appinsp_dbuser [dbOwner@appinspect_prod]"
        );
        assert_eq!(
            plan.steps[4].to_string(),
            " 5. create index (B ASC, A ASC) on Right"
        );
        assert_eq!(plan.collections(), vec!["Left", "Right"]);
        assert_eq!(plan.indexes_for("Left"), vec![&IndexSpec::ascending(&["A"])]);
    }

    #[test]
    fn role_db_defaults_to_selected_database() {
        let plan = ProvisioningPlan::build(&Settings::default(), &registry_with(Arc::new(Pair)))
            .unwrap();
        assert!(plan.role_db_mismatch().is_empty());
    }

    #[test]
    fn explicit_role_db_mismatch_is_reported() {
        let mut settings = Settings::default();
        settings.app_user.role_db = Some("appinsp_prod".to_string());

        let plan = ProvisioningPlan::build(&settings, &registry_with(Arc::new(Pair))).unwrap();

        assert_eq!(plan.role_db_mismatch(), vec!["appinsp_prod"]);
        assert_eq!(plan.user().unwrap().roles[0].db, "appinsp_prod");
    }

    struct IndexFirst;

    impl Module for IndexFirst {
        fn name(&self) -> &'static str {
            "index-first"
        }

        fn migrations(&self) -> Vec<Migration> {
            vec![
                Migration::create_index("03", "Late", &["A"]),
                Migration::create_collection("04", "Late"),
            ]
        }
    }

    #[test]
    fn index_before_collection_is_rejected() {
        let err = ProvisioningPlan::build(&Settings::default(), &registry_with(Arc::new(IndexFirst)))
            .unwrap_err();
        assert!(err.to_string().contains("before it is created"));
    }

    #[test]
    fn empty_database_name_is_rejected() {
        let mut settings = Settings::default();
        settings.database.name = "  ".to_string();
        assert!(ProvisioningPlan::build(&settings, &ModuleRegistry::new()).is_err());
    }

    #[test]
    fn json_form_never_contains_password() {
        let mut settings = Settings::default();
        settings.app_user.password = Some(crate::settings::Secret::new("top-secret"));

        let plan = ProvisioningPlan::build(&settings, &registry_with(Arc::new(Pair))).unwrap();
        let json = serde_json::to_string(&plan).unwrap();

        assert!(!json.contains("top-secret"));
        assert!(json.contains("\"kind\":\"create_user\""));
        assert!(json.contains("\"ordinal\":2"));
    }
}
