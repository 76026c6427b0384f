//! Module-side lifecycle contract.
//!
//! A module is a passive responder: the host drives it through
//! `init -> (process)* -> cleanup`. State is owned per instance so a host can
//! run one instance per worker without shared mutable state.

pub mod instance;
pub mod transform;

pub use instance::{LifecycleState, ModuleInstance};
pub use transform::{DoubleIncrement, Transform};
