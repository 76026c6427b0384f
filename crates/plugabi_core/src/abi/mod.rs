//! Binary-level contract: result codes and ABI versioning.

pub mod code;
pub mod version;
