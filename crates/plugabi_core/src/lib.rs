//! Contract and host driver for versioned, stateful compute modules.
//! This crate is the single source of truth for ABI codes and lifecycle rules.
//!
//! Without the default `host` feature only the ABI codes and the module-side
//! lifecycle are built, which is all a module binary links.

pub mod abi;
#[cfg(feature = "host")]
pub mod config;
#[cfg(feature = "host")]
pub mod envelope;
#[cfg(feature = "host")]
pub mod host;
#[cfg(feature = "host")]
pub mod logging;
pub mod module;
#[cfg(feature = "host")]
pub mod store;

pub use abi::code::{
    decode_payload, decode_status, encode_payload, encode_status, AbiError, CallFailure,
    ABI_SUCCESS,
};
pub use abi::version::{AbiVersion, CompatibilityError, CompatibilityPolicy, CURRENT_ABI_VERSION};
#[cfg(feature = "host")]
pub use config::{ConfigError, HostConfig};
#[cfg(feature = "host")]
pub use envelope::{
    execute_request, handle_request, parse_request, render_outcome, run_request, ErrorResponse,
    RunError, RunErrorKind, RunRequest, RunResponse,
};
#[cfg(feature = "host")]
pub use host::{
    run_once, BindingError, Export, HostError, HostResult, InstanceBinding, LoadedModule,
    ModuleBinding, NullaryExport, SymbolTable, UnaryExport,
};
#[cfg(feature = "host")]
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use module::{DoubleIncrement, LifecycleState, ModuleInstance, Transform};
#[cfg(feature = "host")]
pub use store::{
    is_valid_module_name, DirectoryStore, ModuleRegistry, ModuleStore, RegistryError, StoreError,
    StoreKind, REFERENCE_MODULE_NAME,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
