use std::sync::Arc;

use appinspect_kernel::{Migration, Module};

pub const COLLECTION: &str = "AppInspectFileRecord";

/// Files extracted from an application package. `AppId` refers to
/// `AppInspectAppEntry.Id` but nothing enforces it.
pub struct FileRecordModule;

impl FileRecordModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Module for FileRecordModule {
    fn name(&self) -> &'static str {
        "file_record"
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration::create_collection("05_collection_file_record", COLLECTION),
            Migration::create_index("09_index_file_record", COLLECTION, &["AppId", "Created"]),
        ]
    }
}

pub fn create_module() -> Arc<dyn Module> {
    Arc::new(FileRecordModule::new())
}
