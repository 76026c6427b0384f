//! Host-side contract enforcement.
//!
//! Loading binaries and sandboxing them belong to the embedding runtime; this
//! module starts at the point where a loader can invoke exports by name.

pub mod binding;
pub mod loaded;
pub mod symbols;

pub use binding::{BindingError, Export, InstanceBinding, ModuleBinding};
pub use loaded::{run_once, HostError, HostResult, LoadedModule};
pub use symbols::{NullaryExport, SymbolTable, UnaryExport};
