//! The administrative surface a provisioning run needs from a server.

use async_trait::async_trait;
use serde::Deserialize;

use appinspect_kernel::{IndexSpec, RoleGrant, Secret, UserSpec};

use crate::error::ProvisionError;

/// Name the server gives the primary-key index.
pub const PRIMARY_INDEX_NAME: &str = "_id_";

/// A user as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub user: String,
    pub db: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// An index as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub keys: Vec<(String, i64)>,
    pub unique: bool,
}

impl IndexInfo {
    pub fn is_primary(&self) -> bool {
        self.name == PRIMARY_INDEX_NAME
    }

    /// Same fields, same order, same directions.
    pub fn matches(&self, spec: &IndexSpec) -> bool {
        self.keys == spec.key_pattern()
    }
}

/// Per-database administrative commands, bound to one selected database.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    /// Logical database the backend is bound to.
    fn database(&self) -> &str;

    /// Round-trip to the server; failure is a fatal connection error.
    async fn ping(&self) -> Result<(), ProvisionError>;

    async fn find_user(&self, name: &str) -> Result<Option<UserInfo>, ProvisionError>;

    async fn create_user(&self, user: &UserSpec, password: &Secret) -> Result<(), ProvisionError>;

    async fn collection_names(&self) -> Result<Vec<String>, ProvisionError>;

    async fn create_collection(&self, name: &str) -> Result<(), ProvisionError>;

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>, ProvisionError>;

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), ProvisionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_match_is_order_sensitive() {
        let info = IndexInfo {
            name: "Created_1_Action_1".to_string(),
            keys: vec![("Created".to_string(), 1), ("Action".to_string(), 1)],
            unique: false,
        };

        assert!(info.matches(&IndexSpec::ascending(&["Created", "Action"])));
        assert!(!info.matches(&IndexSpec::ascending(&["Action", "Created"])));
        assert!(!info.matches(&IndexSpec::ascending(&["Created"])));
        assert!(!info.is_primary());
    }
}
