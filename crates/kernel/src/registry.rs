use std::collections::HashSet;
use std::sync::Arc;

use anyhow::bail;

use crate::module::{Migration, Module};

/// Module registry holding every collection module in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        tracing::debug!(module = module.name(), "registering module");
        self.modules.push(module);
    }

    /// Get all registered modules
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Collect all migrations, ordered by migration id.
    ///
    /// Fails on duplicate module names or duplicate migration ids.
    pub fn collect_migrations(&self) -> anyhow::Result<Vec<(String, Migration)>> {
        let mut names = HashSet::new();
        for module in &self.modules {
            if !names.insert(module.name()) {
                bail!("module '{}' is registered twice", module.name());
            }
        }

        let mut migrations = Vec::new();
        for module in &self.modules {
            for migration in module.migrations() {
                migrations.push((module.name().to_string(), migration));
            }
        }

        migrations.sort_by(|a, b| a.1.id.cmp(b.1.id).then_with(|| a.0.cmp(&b.0)));

        for pair in migrations.windows(2) {
            if pair[0].1.id == pair[1].1.id {
                bail!(
                    "migration id '{}' is declared by both '{}' and '{}'",
                    pair[0].1.id,
                    pair[0].0,
                    pair[1].0
                );
            }
        }

        Ok(migrations)
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
