//! Reference compute module: a reactor-style library exporting the plugabi
//! lifecycle contract with the `input * 2 + 1` payload.
//!
//! Build as `cdylib` (e.g. `--target wasm32-unknown-unknown`) for an external
//! host; the default build links only the ABI codes and lifecycle from
//! `plugabi_core`. With the `host` feature, link as `rlib` and bind through
//! `api::symbol_table`.

pub mod api;

#[cfg(feature = "host")]
pub use api::symbol_table;
