use crate::schema::IndexSpec;

/// One schema operation contributed by a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStep {
    CreateCollection {
        name: &'static str,
    },
    CreateIndex {
        collection: &'static str,
        index: IndexSpec,
    },
}

/// Migration definition for modules
///
/// Ids are zero-padded ordinals; sorting every module's migrations by id
/// yields the order the steps run in.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub step: SchemaStep,
}

impl Migration {
    pub fn create_collection(id: &'static str, name: &'static str) -> Self {
        Self {
            id,
            step: SchemaStep::CreateCollection { name },
        }
    }

    pub fn create_index(id: &'static str, collection: &'static str, fields: &[&str]) -> Self {
        Self {
            id,
            step: SchemaStep::CreateIndex {
                collection,
                index: IndexSpec::ascending(fields),
            },
        }
    }
}

/// A collection owner that declares its schema.
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Return migrations contributed by this module
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }
}
