use std::sync::Arc;

use appinspect_kernel::{Migration, Module};

pub const COLLECTION: &str = "AppInspectStoreRecord";

pub struct StoreRecordModule;

impl StoreRecordModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for StoreRecordModule {
    fn name(&self) -> &'static str {
        "store_record"
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration::create_collection("06_collection_store_record", COLLECTION),
            Migration::create_index("10_index_store_record", COLLECTION, &["AppId", "Retrieved"]),
        ]
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(StoreRecordModule::new())
}
