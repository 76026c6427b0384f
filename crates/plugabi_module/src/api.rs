//! C-ABI export surface of the reference module.
//!
//! # Responsibility
//! - Export the lifecycle contract under exact, unmangled symbol names.
//! - Encode typed lifecycle results into the `i32` channel at this edge only.
//!
//! # Invariants
//! - Exported functions never panic or unwind across the boundary.
//! - Exports take and return `i32` only.
//! - No I/O, no logging, no allocation; every call finishes in bounded steps.

use plugabi_core::{
    encode_payload, encode_status, DoubleIncrement, ModuleInstance, CURRENT_ABI_VERSION,
};
use std::sync::{Mutex, MutexGuard, PoisonError};

// One instance per loaded binary; a sandboxed runtime gives each loaded
// instance its own copy of this static.
static INSTANCE: Mutex<ModuleInstance<DoubleIncrement>> =
    Mutex::new(ModuleInstance::new(DoubleIncrement));

fn instance() -> MutexGuard<'static, ModuleInstance<DoubleIncrement>> {
    // Instance state is always consistent between calls, so a poisoned lock
    // is still safe to reuse.
    INSTANCE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reports the ABI version as `major * 10000 + minor * 100 + patch`.
///
/// # FFI contract
/// - Pure; callable in any state, including before `init`.
#[no_mangle]
pub extern "C" fn get_abi_version() -> i32 {
    CURRENT_ABI_VERSION.encode()
}

/// Moves the module to `Ready` and resets the call counter.
///
/// # FFI contract
/// - Returns `0`, or `-2` when already initialized (state unchanged).
#[no_mangle]
pub extern "C" fn init() -> i32 {
    encode_status(instance().init())
}

/// Computes `input * 2 + 1`.
///
/// # FFI contract
/// - Returns the non-negative result on success.
/// - `-1` before `init`, `-3` for negative input, `-4` when the result would
///   not be a valid non-negative payload.
#[no_mangle]
pub extern "C" fn process(input: i32) -> i32 {
    encode_payload(instance().process(input))
}

/// Moves the module back to `Uninitialized`.
///
/// # FFI contract
/// - Returns `-1` only if `init` never succeeded on this instance.
/// - Repeated calls after an init return `0`.
#[no_mangle]
pub extern "C" fn cleanup() -> i32 {
    encode_status(instance().cleanup())
}

/// Successful `process` calls since the last `init`.
#[no_mangle]
pub extern "C" fn get_call_count() -> i32 {
    i32::try_from(instance().call_count()).unwrap_or(i32::MAX)
}

/// `1` when initialized, else `0`.
#[no_mangle]
pub extern "C" fn is_initialized() -> i32 {
    i32::from(instance().is_initialized())
}

/// Export table for hosting this module in-process.
#[cfg(feature = "host")]
pub fn symbol_table() -> plugabi_core::SymbolTable {
    let mut table = plugabi_core::SymbolTable::new();
    table.insert_nullary("get_abi_version", get_abi_version);
    table.insert_nullary("init", init);
    table.insert_unary("process", process);
    table.insert_nullary("cleanup", cleanup);
    table.insert_nullary("get_call_count", get_call_count);
    table.insert_nullary("is_initialized", is_initialized);
    table
}

#[cfg(test)]
mod tests {
    use super::{
        cleanup, get_abi_version, get_call_count, init, instance, is_initialized, process,
    };
    use plugabi_core::{DoubleIncrement, ModuleInstance};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // Exports share one static instance; tests take turns and start fresh.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn fresh() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        *instance() = ModuleInstance::new(DoubleIncrement);
        guard
    }

    #[test]
    fn end_to_end_through_exports() {
        let _guard = fresh();
        assert_eq!(get_abi_version(), 10_000);
        assert_eq!(init(), 0);
        assert_eq!(process(5), 11);
        assert_eq!(process(10), 21);
        assert_eq!(get_call_count(), 2);
        assert_eq!(cleanup(), 0);
        assert_eq!(process(5), -1);
    }

    #[test]
    fn misuse_returns_codes() {
        let _guard = fresh();
        assert_eq!(cleanup(), -1);
        assert_eq!(process(1), -1);
        assert_eq!(init(), 0);
        assert_eq!(init(), -2);
        assert_eq!(is_initialized(), 1);
        assert_eq!(process(-5), -3);
        assert_eq!(process(i32::MAX), -4);
        assert_eq!(get_call_count(), 0);
        assert_eq!(cleanup(), 0);
        assert_eq!(cleanup(), 0);
        assert_eq!(is_initialized(), 0);
    }

    #[cfg(feature = "host")]
    #[test]
    fn symbol_table_exposes_every_export() {
        use super::symbol_table;
        use plugabi_core::{CompatibilityPolicy, Export, LoadedModule, ModuleBinding};

        let _guard = fresh();
        let table = symbol_table();
        assert!(Export::ALL.iter().all(|export| table.has_export(*export)));

        let policy = CompatibilityPolicy::default();
        let mut module = LoadedModule::attach("plugabi_module", table, &policy).expect("attach");
        module.init().expect("init");
        assert_eq!(module.process(21), Ok(43));
        assert_eq!(module.call_count(), Ok(Some(1)));
        module.cleanup().expect("cleanup");
    }
}
