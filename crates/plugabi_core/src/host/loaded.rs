//! Host-side driver for one attached module instance.
//!
//! # Responsibility
//! - Refuse modules that lack required exports or report an incompatible
//!   ABI version, before any other export is trusted.
//! - Decode the integer channel into typed host errors.
//!
//! # Invariants
//! - `get_abi_version` is the first export invoked on every module.
//! - After `close()`, every call fails with [`HostError::Closed`].
//! - Driver never panics on module misbehavior; every outcome is a value.

use crate::abi::code::{decode_payload, decode_status, CallFailure};
use crate::abi::version::{AbiVersion, CompatibilityError, CompatibilityPolicy};
use crate::host::binding::{BindingError, Export, ModuleBinding};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced to host callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    MissingExport(Export),
    Incompatible(CompatibilityError),
    Binding(BindingError),
    Call { export: Export, failure: CallFailure },
    Closed,
}

impl HostError {
    /// Failure reported by the module itself, if any.
    pub fn call_failure(&self) -> Option<CallFailure> {
        match self {
            Self::Call { failure, .. } => Some(*failure),
            _ => None,
        }
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingExport(export) => {
                write!(f, "module is missing required export `{export}`")
            }
            Self::Incompatible(err) => write!(f, "{err}"),
            Self::Binding(err) => write!(f, "{err}"),
            Self::Call { export, failure } => write!(f, "{export}() returned {failure}"),
            Self::Closed => write!(f, "module is closed"),
        }
    }
}

impl Error for HostError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Incompatible(err) => Some(err),
            Self::Binding(err) => Some(err),
            Self::Call { failure, .. } => Some(failure),
            Self::MissingExport(_) | Self::Closed => None,
        }
    }
}

impl From<CompatibilityError> for HostError {
    fn from(value: CompatibilityError) -> Self {
        Self::Incompatible(value)
    }
}

impl From<BindingError> for HostError {
    fn from(value: BindingError) -> Self {
        Self::Binding(value)
    }
}

/// A module instance that passed export discovery and the version gate.
#[derive(Debug)]
pub struct LoadedModule<B> {
    id: Uuid,
    label: String,
    version: AbiVersion,
    binding: Option<B>,
}

impl<B: ModuleBinding> LoadedModule<B> {
    /// Discovers exports, checks the ABI version and returns a driveable
    /// module. `label` is used for diagnostics only.
    pub fn attach(
        label: impl Into<String>,
        mut binding: B,
        policy: &CompatibilityPolicy,
    ) -> HostResult<Self> {
        let id = Uuid::new_v4();
        let label = label.into();

        if let Some(missing) = Export::REQUIRED
            .into_iter()
            .find(|export| !binding.has_export(*export))
        {
            warn!(
                "event=module_attach module=host status=error instance={} label={} \
                 missing_export={}",
                id, label, missing
            );
            return Err(HostError::MissingExport(missing));
        }

        let reported = binding.call(Export::GetAbiVersion, None)?;
        let version = policy.check(reported).map_err(|err| {
            warn!(
                "event=module_attach module=host status=error instance={} label={} \
                 reported_version={} reason={}",
                id, label, reported, err
            );
            HostError::from(err)
        })?;

        info!(
            "event=module_attach module=host status=ok instance={} label={} abi_version={}",
            id, label, version
        );
        Ok(Self {
            id,
            label,
            version,
            binding: Some(binding),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn version(&self) -> AbiVersion {
        self.version
    }

    pub fn is_closed(&self) -> bool {
        self.binding.is_none()
    }

    pub fn init(&mut self) -> HostResult<()> {
        let raw = self.invoke(Export::Init, None)?;
        self.status(Export::Init, raw)
    }

    /// Runs `process(input)` and returns the decoded payload.
    pub fn process(&mut self, input: i32) -> HostResult<i32> {
        let raw = self.invoke(Export::Process, Some(input))?;
        decode_payload(raw).map_err(|failure| self.failed(Export::Process, failure))
    }

    pub fn cleanup(&mut self) -> HostResult<()> {
        let raw = self.invoke(Export::Cleanup, None)?;
        self.status(Export::Cleanup, raw)
    }

    /// Returns `Ok(None)` when the module omits the optional export.
    pub fn call_count(&mut self) -> HostResult<Option<u32>> {
        if !self.has_export(Export::GetCallCount)? {
            return Ok(None);
        }
        let raw = self.invoke(Export::GetCallCount, None)?;
        let count = decode_payload(raw)
            .map_err(|failure| self.failed(Export::GetCallCount, failure))?;
        Ok(Some(count.unsigned_abs()))
    }

    /// Returns `Ok(None)` when the module omits the optional export.
    pub fn is_initialized(&mut self) -> HostResult<Option<bool>> {
        if !self.has_export(Export::IsInitialized)? {
            return Ok(None);
        }
        let raw = self.invoke(Export::IsInitialized, None)?;
        Ok(Some(raw != 0))
    }

    /// Releases the binding. Safe to call repeatedly.
    pub fn close(&mut self) -> Option<B> {
        let binding = self.binding.take();
        if binding.is_some() {
            debug!(
                "event=module_close module=host status=ok instance={} label={}",
                self.id, self.label
            );
        }
        binding
    }

    fn has_export(&self, export: Export) -> HostResult<bool> {
        self.binding
            .as_ref()
            .map(|binding| binding.has_export(export))
            .ok_or(HostError::Closed)
    }

    fn invoke(&mut self, export: Export, input: Option<i32>) -> HostResult<i32> {
        let binding = self.binding.as_mut().ok_or(HostError::Closed)?;
        let raw = binding.call(export, input)?;
        debug!(
            "event=module_call module=host instance={} export={} raw={}",
            self.id, export, raw
        );
        Ok(raw)
    }

    fn status(&self, export: Export, raw: i32) -> HostResult<()> {
        decode_status(raw).map_err(|failure| self.failed(export, failure))
    }

    fn failed(&self, export: Export, failure: CallFailure) -> HostError {
        warn!(
            "event=module_call module=host status=error instance={} label={} export={} code={}",
            self.id,
            self.label,
            export,
            failure.raw()
        );
        HostError::Call { export, failure }
    }
}

/// Attaches, initializes, processes one input, cleans up and closes.
///
/// Cleanup runs whenever `init` succeeded; its failure is logged and does not
/// override the process outcome.
pub fn run_once<B: ModuleBinding>(
    label: &str,
    binding: B,
    policy: &CompatibilityPolicy,
    input: i32,
) -> HostResult<i32> {
    let mut module = LoadedModule::attach(label, binding, policy)?;
    let outcome = match module.init() {
        Ok(()) => {
            let output = module.process(input);
            if let Err(err) = module.cleanup() {
                warn!(
                    "event=module_cleanup module=host status=error instance={} reason={}",
                    module.id(),
                    err
                );
            }
            output
        }
        Err(err) => Err(err),
    };
    module.close();
    outcome
}

#[cfg(test)]
mod tests {
    use super::{run_once, HostError, LoadedModule};
    use crate::abi::code::{AbiError, CallFailure};
    use crate::abi::version::{CompatibilityPolicy, CURRENT_ABI_VERSION};
    use crate::host::binding::{Export, InstanceBinding};
    use crate::module::transform::DoubleIncrement;

    fn reference_binding() -> InstanceBinding<DoubleIncrement> {
        InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION)
    }

    #[test]
    fn run_once_returns_payload() {
        let output = run_once(
            "double",
            reference_binding(),
            &CompatibilityPolicy::default(),
            21,
        )
        .expect("run");
        assert_eq!(output, 43);
    }

    #[test]
    fn run_once_surfaces_invalid_input() {
        let err = run_once(
            "double",
            reference_binding(),
            &CompatibilityPolicy::default(),
            -1,
        )
        .expect_err("negative input must fail");
        assert_eq!(
            err,
            HostError::Call {
                export: Export::Process,
                failure: CallFailure::Known(AbiError::InvalidInput),
            }
        );
    }

    #[test]
    fn closed_module_rejects_calls() {
        let mut module = LoadedModule::attach(
            "double",
            reference_binding(),
            &CompatibilityPolicy::default(),
        )
        .expect("attach");
        assert!(module.close().is_some());
        assert!(module.close().is_none());
        assert!(module.is_closed());
        assert_eq!(module.init(), Err(HostError::Closed));
        assert_eq!(module.call_count(), Err(HostError::Closed));
    }
}
