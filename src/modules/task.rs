use std::sync::Arc;

use appinspect_kernel::{Migration, Module};

pub const COLLECTION: &str = "AppInspectTask";

/// Worker tasks, listed by creation time and then action.
pub struct TaskModule;

impl TaskModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for TaskModule {
    fn name(&self) -> &'static str {
        "task"
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration::create_collection("04_collection_task", COLLECTION),
            // Runs before the app entry index.
            Migration::create_index("07_index_task", COLLECTION, &["Created", "Action"]),
        ]
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(TaskModule::new())
}
