//! Declarative shapes for the objects a provisioning run creates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::Secret;

/// Sort direction of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
}

impl SortOrder {
    /// Numeric direction used in index key patterns.
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub order: SortOrder,
}

/// A non-unique secondary index. Field order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub fields: Vec<IndexField>,
}

impl IndexSpec {
    pub fn ascending(fields: &[&str]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|name| IndexField {
                    name: (*name).to_string(),
                    order: SortOrder::Ascending,
                })
                .collect(),
        }
    }

    /// `(name, direction)` pairs in declaration order.
    pub fn key_pattern(&self) -> Vec<(String, i64)> {
        self.fields
            .iter()
            .map(|field| (field.name.clone(), i64::from(field.order.direction())))
            .collect()
    }

    /// The name the server assigns when none is given, e.g. `Created_1_Action_1`.
    pub fn default_name(&self) -> String {
        self.fields
            .iter()
            .map(|field| format!("{}_{}", field.name, field.order.direction()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|field| match field.order {
                SortOrder::Ascending => format!("{} ASC", field.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({fields})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub db: String,
}

/// Application credential created in step 2.
#[derive(Debug, Clone, Serialize)]
pub struct UserSpec {
    pub name: String,
    #[serde(skip)]
    pub password: Option<Secret>,
    pub roles: Vec<RoleGrant>,
}

impl fmt::Display for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles = self
            .roles
            .iter()
            .map(|grant| format!("{}@{}", grant.role, grant.db))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} [{}]", self.name, roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pattern_keeps_declaration_order() {
        let index = IndexSpec::ascending(&["Created", "Action"]);
        assert_eq!(
            index.key_pattern(),
            vec![("Created".to_string(), 1), ("Action".to_string(), 1)]
        );
        assert_ne!(index, IndexSpec::ascending(&["Action", "Created"]));
    }

    #[test]
    fn default_name_follows_server_convention() {
        assert_eq!(
            IndexSpec::ascending(&["AppId", "Retrieved"]).default_name(),
            "AppId_1_Retrieved_1"
        );
        assert_eq!(IndexSpec::ascending(&["Id"]).default_name(), "Id_1");
    }

    #[test]
    fn user_display_hides_password() {
        let user = UserSpec {
            name: "appinsp_dbuser".to_string(),
            password: Some(Secret::new("pw")),
            roles: vec![RoleGrant {
                role: "dbOwner".to_string(),
                db: "appinsp_prod".to_string(),
            }],
        };
        assert_eq!(user.to_string(), "appinsp_dbuser [dbOwner@appinsp_prod]");
        assert!(!format!("{user:?}").contains("pw\""));
    }
}
