//! Error taxonomy for provisioning runs

use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Kind of server-side object a create step targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Collection,
    Index,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::User => "user",
            ResourceKind::Collection => "collection",
            ResourceKind::Index => "index",
        })
    }
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Server unreachable or the administrative credential was refused.
    #[error("failed to connect to {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    /// Present, but not in the shape the plan asks for. Never skipped.
    #[error("{kind} '{name}' exists but differs from the plan: {detail}")]
    Conflicting {
        kind: ResourceKind,
        name: String,
        detail: String,
    },

    #[error("no password configured for user '{user}'")]
    MissingPassword { user: String },

    #[error("step {ordinal} ({description}) failed: {source}")]
    Step {
        ordinal: usize,
        description: String,
        #[source]
        source: Box<ProvisionError>,
    },

    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ProvisionError {
    pub fn connection(endpoint: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    pub fn already_exists(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn conflicting(
        kind: ResourceKind,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Conflicting {
            kind,
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// The error underneath any `Step` wrapping.
    pub fn root(&self) -> &ProvisionError {
        match self {
            ProvisionError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// Ordinal of the failing step, when known.
    pub fn ordinal(&self) -> Option<usize> {
        match self {
            ProvisionError::Step { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }

    pub fn is_fatal_connection(&self) -> bool {
        matches!(self.root(), ProvisionError::Connection { .. })
    }
}
