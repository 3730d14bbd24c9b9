pub mod app_entry;
pub mod file_record;
pub mod store_record;
pub mod task;

use appinspect_kernel::ModuleRegistry;

/// Register every collection module with the registry
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(app_entry::create_module());
    registry.register(task::create_module());
    registry.register(file_record::create_module());
    registry.register(store_record::create_module());
}
