pub mod books;

use std::sync::Arc;

use folio_kernel::ModuleRegistry;
use folio_store::EntityStore;

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, store: &Arc<dyn EntityStore>) {
    registry.register(books::create_module(store.clone()));
}
