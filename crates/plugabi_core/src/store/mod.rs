//! Module discovery: filesystem stores and the in-process registry.

pub mod directory;
pub mod registry;

pub use directory::{is_valid_module_name, DirectoryStore, ModuleStore, StoreError, StoreKind};
pub use registry::{BindingFactory, ModuleRegistry, RegistryError, REFERENCE_MODULE_NAME};
