//! Export surface and the binding seam between host and loader.
//!
//! # Responsibility
//! - Name the exact, unmangled symbols a module exports.
//! - Abstract how a loaded module's exports are invoked, so the host driver
//!   works with any loader (in-process instance, resolved symbol table, VM).
//!
//! # Invariants
//! - Bindings exchange raw `i32` values only; decoding is the host's job.
//! - Calling an absent export is a binding error, never a panic.

use crate::abi::code::{encode_payload, encode_status};
use crate::abi::version::AbiVersion;
use crate::module::instance::ModuleInstance;
use crate::module::transform::Transform;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One entry of the module export surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Export {
    GetAbiVersion,
    Init,
    Process,
    Cleanup,
    GetCallCount,
    IsInitialized,
}

impl Export {
    pub const ALL: [Export; 6] = [
        Self::GetAbiVersion,
        Self::Init,
        Self::Process,
        Self::Cleanup,
        Self::GetCallCount,
        Self::IsInitialized,
    ];

    /// Exports a host must find before trusting a module.
    pub const REQUIRED: [Export; 4] = [
        Self::GetAbiVersion,
        Self::Init,
        Self::Process,
        Self::Cleanup,
    ];

    /// Exact symbol name in the binary.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GetAbiVersion => "get_abi_version",
            Self::Init => "init",
            Self::Process => "process",
            Self::Cleanup => "cleanup",
            Self::GetCallCount => "get_call_count",
            Self::IsInitialized => "is_initialized",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|export| export.symbol() == symbol)
    }

    pub const fn is_required(self) -> bool {
        !matches!(self, Self::GetCallCount | Self::IsInitialized)
    }

    /// `process` is the only export taking an argument.
    pub const fn takes_input(self) -> bool {
        matches!(self, Self::Process)
    }
}

impl Display for Export {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Failures raised by a binding before the module returned a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    MissingExport(Export),
    ArityMismatch { export: Export, expected: usize },
}

impl Display for BindingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExport(export) => write!(f, "module does not export `{export}`"),
            Self::ArityMismatch { export, expected } => {
                write!(f, "export `{export}` expects {expected} argument(s)")
            }
        }
    }
}

impl Error for BindingError {}

/// Raw access to one loaded module instance.
pub trait ModuleBinding {
    fn has_export(&self, export: Export) -> bool;

    /// Invokes `export`; `input` must be `Some` exactly for `process`.
    fn call(&mut self, export: Export, input: Option<i32>) -> Result<i32, BindingError>;
}

impl<B: ModuleBinding + ?Sized> ModuleBinding for Box<B> {
    fn has_export(&self, export: Export) -> bool {
        (**self).has_export(export)
    }

    fn call(&mut self, export: Export, input: Option<i32>) -> Result<i32, BindingError> {
        (**self).call(export, input)
    }
}

/// Checks argument count against the export signature.
pub fn check_arity(export: Export, input: Option<i32>) -> Result<Option<i32>, BindingError> {
    match (export.takes_input(), input) {
        (true, Some(_)) | (false, None) => Ok(input),
        (true, None) => Err(BindingError::ArityMismatch {
            export,
            expected: 1,
        }),
        (false, Some(_)) => Err(BindingError::ArityMismatch {
            export,
            expected: 0,
        }),
    }
}

/// In-process binding that owns a typed instance and encodes at the edge.
#[derive(Debug, Clone)]
pub struct InstanceBinding<T> {
    instance: ModuleInstance<T>,
    version: AbiVersion,
}

impl<T: Transform> InstanceBinding<T> {
    pub fn new(transform: T, version: AbiVersion) -> Self {
        Self {
            instance: ModuleInstance::new(transform),
            version,
        }
    }

    pub fn instance(&self) -> &ModuleInstance<T> {
        &self.instance
    }
}

impl<T: Transform> ModuleBinding for InstanceBinding<T> {
    fn has_export(&self, _export: Export) -> bool {
        true
    }

    fn call(&mut self, export: Export, input: Option<i32>) -> Result<i32, BindingError> {
        let input = check_arity(export, input)?;
        let raw = match export {
            Export::GetAbiVersion => self.version.encode(),
            Export::Init => encode_status(self.instance.init()),
            Export::Process => encode_payload(self.instance.process(input.unwrap_or_default())),
            Export::Cleanup => encode_status(self.instance.cleanup()),
            Export::GetCallCount => {
                i32::try_from(self.instance.call_count()).unwrap_or(i32::MAX)
            }
            Export::IsInitialized => i32::from(self.instance.is_initialized()),
        };
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{BindingError, Export, InstanceBinding, ModuleBinding};
    use crate::abi::version::CURRENT_ABI_VERSION;
    use crate::module::transform::DoubleIncrement;

    #[test]
    fn symbols_match_export_table() {
        let symbols: Vec<&str> = Export::ALL.iter().map(|export| export.symbol()).collect();
        assert_eq!(
            symbols,
            vec![
                "get_abi_version",
                "init",
                "process",
                "cleanup",
                "get_call_count",
                "is_initialized"
            ]
        );
        assert_eq!(Export::from_symbol("process"), Some(Export::Process));
        assert_eq!(Export::from_symbol("_Z4initv"), None);
        assert!(Export::REQUIRED.iter().all(|export| export.is_required()));
        assert!(!Export::GetCallCount.is_required());
    }

    #[test]
    fn instance_binding_encodes_raw_codes() {
        let mut binding = InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION);
        assert_eq!(binding.call(Export::GetAbiVersion, None), Ok(10_000));
        assert_eq!(binding.call(Export::Process, Some(5)), Ok(-1));
        assert_eq!(binding.call(Export::Init, None), Ok(0));
        assert_eq!(binding.call(Export::Process, Some(5)), Ok(11));
        assert_eq!(binding.call(Export::IsInitialized, None), Ok(1));
        assert_eq!(binding.call(Export::GetCallCount, None), Ok(1));
    }

    #[test]
    fn instance_binding_rejects_wrong_arity() {
        let mut binding = InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION);
        assert_eq!(
            binding.call(Export::Process, None),
            Err(BindingError::ArityMismatch {
                export: Export::Process,
                expected: 1
            })
        );
        assert!(binding.call(Export::Init, Some(1)).is_err());
    }
}
