use std::sync::Arc;

use appinspect_kernel::{Migration, Module};

pub const COLLECTION: &str = "AppInspectAppEntry";

/// One document per inspected application, looked up by `Id`.
pub struct AppEntryModule;

impl AppEntryModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for AppEntryModule {
    fn name(&self) -> &'static str {
        "app_entry"
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration::create_collection("03_collection_app_entry", COLLECTION),
            Migration::create_index("08_index_app_entry", COLLECTION, &["Id"]),
        ]
    }
}

/// Create a new instance of the app entry module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(AppEntryModule::new())
}
