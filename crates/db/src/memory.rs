//! In-process stand-in for a database server.
//!
//! Mirrors the server's conflict behaviour: creating an existing user or
//! collection fails, creating an identical index is a no-op.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use appinspect_kernel::{IndexSpec, Secret, UserSpec};

use crate::backend::{AdminBackend, IndexInfo, UserInfo, PRIMARY_INDEX_NAME};
use crate::error::ProvisionError;

#[derive(Default)]
struct State {
    reachable: bool,
    users: Vec<UserInfo>,
    collections: Vec<(String, Vec<IndexInfo>)>,
    mutations: Vec<String>,
}

pub struct MemoryBackend {
    database: String,
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: Mutex::new(State {
                reachable: true,
                ..State::default()
            }),
        }
    }

    /// A backend whose ping always fails.
    pub fn unreachable(database: impl Into<String>) -> Self {
        let backend = Self::new(database);
        if let Ok(mut state) = backend.state.lock() {
            state.reachable = false;
        }
        backend
    }

    /// Insert a user directly, bypassing `create_user`.
    pub fn seed_user(&self, user: UserInfo) -> Result<(), ProvisionError> {
        self.state()?.users.push(user);
        Ok(())
    }

    /// Insert a collection (with its `_id_` index) directly.
    pub fn seed_collection(&self, name: &str) -> Result<(), ProvisionError> {
        self.state()?
            .collections
            .push((name.to_string(), vec![primary_index()]));
        Ok(())
    }

    /// Attach an arbitrary index to an existing collection.
    pub fn seed_index(&self, collection: &str, index: IndexInfo) -> Result<(), ProvisionError> {
        let mut state = self.state()?;
        let indexes = indexes_mut(&mut state, collection)?;
        indexes.push(index);
        Ok(())
    }

    /// Mutating calls in the order they reached the backend.
    pub fn mutations(&self) -> Result<Vec<String>, ProvisionError> {
        Ok(self.state()?.mutations.clone())
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, ProvisionError> {
        self.state
            .lock()
            .map_err(|_| ProvisionError::Backend("memory backend lock poisoned".to_string()))
    }
}

fn primary_index() -> IndexInfo {
    IndexInfo {
        name: PRIMARY_INDEX_NAME.to_string(),
        keys: vec![("_id".to_string(), 1)],
        unique: true,
    }
}

fn indexes_mut<'a>(
    state: &'a mut State,
    collection: &str,
) -> Result<&'a mut Vec<IndexInfo>, ProvisionError> {
    state
        .collections
        .iter_mut()
        .find(|(name, _)| name == collection)
        .map(|(_, indexes)| indexes)
        .ok_or_else(|| ProvisionError::Backend(format!("ns does not exist: {collection}")))
}

#[async_trait]
impl AdminBackend for MemoryBackend {
    fn database(&self) -> &str {
        &self.database
    }

    async fn ping(&self) -> Result<(), ProvisionError> {
        if self.state()?.reachable {
            Ok(())
        } else {
            Err(ProvisionError::connection(
                "memory://",
                "server selection timed out",
            ))
        }
    }

    async fn find_user(&self, name: &str) -> Result<Option<UserInfo>, ProvisionError> {
        Ok(self
            .state()?
            .users
            .iter()
            .find(|user| user.user == name && user.db == self.database)
            .cloned())
    }

    async fn create_user(&self, user: &UserSpec, _password: &Secret) -> Result<(), ProvisionError> {
        let mut state = self.state()?;
        if state
            .users
            .iter()
            .any(|existing| existing.user == user.name && existing.db == self.database)
        {
            return Err(ProvisionError::Backend(format!(
                "User \"{}@{}\" already exists",
                user.name, self.database
            )));
        }
        state.users.push(UserInfo {
            user: user.name.clone(),
            db: self.database.clone(),
            roles: user.roles.clone(),
        });
        state.mutations.push(format!("createUser {}", user.name));
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>, ProvisionError> {
        Ok(self
            .state()?
            .collections
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn create_collection(&self, name: &str) -> Result<(), ProvisionError> {
        let mut state = self.state()?;
        if state.collections.iter().any(|(existing, _)| existing == name) {
            return Err(ProvisionError::Backend(format!(
                "Collection {}.{} already exists.",
                self.database, name
            )));
        }
        state
            .collections
            .push((name.to_string(), vec![primary_index()]));
        state.mutations.push(format!("create {name}"));
        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<IndexInfo>, ProvisionError> {
        let mut state = self.state()?;
        Ok(indexes_mut(&mut state, collection)?.clone())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<(), ProvisionError> {
        let mut state = self.state()?;
        let name = index.default_name();
        let indexes = indexes_mut(&mut state, collection)?;

        if let Some(existing) = indexes.iter().find(|existing| existing.name == name) {
            if existing.matches(index) && !existing.unique {
                return Ok(());
            }
            return Err(ProvisionError::Backend(format!(
                "An existing index has the same name as the requested index: {name}"
            )));
        }

        indexes.push(IndexInfo {
            name: name.clone(),
            keys: index.key_pattern(),
            unique: false,
        });
        state
            .mutations
            .push(format!("createIndexes {collection} {name}"));
        Ok(())
    }
}
