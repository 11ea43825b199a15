pub mod module;
pub mod registry;
pub mod schema;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
