//! In-process module registry.
//!
//! Each `spawn` builds a fresh binding, so concurrent callers never share
//! module state (instance-per-worker).

use crate::abi::version::CURRENT_ABI_VERSION;
use crate::host::binding::{InstanceBinding, ModuleBinding};
use crate::module::transform::DoubleIncrement;
use crate::store::directory::is_valid_module_name;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name the reference module registers under.
pub const REFERENCE_MODULE_NAME: &str = "double";

/// Builds one fresh module instance per call.
pub type BindingFactory = Box<dyn Fn() -> Box<dyn ModuleBinding + Send> + Send + Sync>;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidName(String),
    DuplicateName(String),
    NotFound(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "invalid module name: {value}"),
            Self::DuplicateName(value) => write!(f, "module already registered: {value}"),
            Self::NotFound(value) => write!(f, "module not found: {value}"),
        }
    }
}

impl Error for RegistryError {}

fn reference_binding() -> Box<dyn ModuleBinding + Send> {
    Box::new(InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION))
}

/// Name to factory map for modules linked into the host process.
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, BindingFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the reference `input * 2 + 1` module.
    pub fn with_reference_module() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(REFERENCE_MODULE_NAME.to_string(), Box::new(reference_binding));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn ModuleBinding + Send> + Send + Sync + 'static,
    {
        let name = name.trim();
        if !is_valid_module_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.factories.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    /// Creates a new, uninitialized instance of `name`.
    pub fn spawn(&self, name: &str) -> Result<Box<dyn ModuleBinding + Send>, RegistryError> {
        self.factories
            .get(name.trim())
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::NotFound(name.trim().to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name.trim())
    }

    /// Sorted registered names.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{ModuleRegistry, RegistryError, REFERENCE_MODULE_NAME};
    use crate::abi::version::CURRENT_ABI_VERSION;
    use crate::host::binding::{Export, InstanceBinding, ModuleBinding};
    use crate::module::transform::DoubleIncrement;

    #[test]
    fn spawned_instances_do_not_share_state() {
        let registry = ModuleRegistry::with_reference_module();
        let mut first = registry.spawn(REFERENCE_MODULE_NAME).expect("spawn");
        let mut second = registry.spawn(REFERENCE_MODULE_NAME).expect("spawn");

        assert_eq!(first.call(Export::Init, None), Ok(0));
        assert_eq!(second.call(Export::IsInitialized, None), Ok(0));
        assert_eq!(second.call(Export::Init, None), Ok(0));
    }

    #[test]
    fn rejects_duplicate_and_invalid_names() {
        let mut registry = ModuleRegistry::with_reference_module();
        let err = registry
            .register(REFERENCE_MODULE_NAME, || {
                Box::new(InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION))
            })
            .expect_err("duplicate must fail");
        assert!(matches!(err, RegistryError::DuplicateName(_)));

        let err = registry
            .register("../x", || {
                Box::new(InstanceBinding::new(DoubleIncrement, CURRENT_ABI_VERSION))
            })
            .expect_err("invalid name must fail");
        assert!(matches!(err, RegistryError::InvalidName(_)));
        assert_eq!(registry.names(), vec![REFERENCE_MODULE_NAME.to_string()]);
    }

    #[test]
    fn reference_module_is_preregistered() {
        let registry = ModuleRegistry::with_reference_module();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(REFERENCE_MODULE_NAME));

        let mut binding = registry.spawn(REFERENCE_MODULE_NAME).expect("spawn");
        assert_eq!(binding.call(Export::GetAbiVersion, None), Ok(10_000));
        assert_eq!(binding.call(Export::Init, None), Ok(0));
        assert_eq!(binding.call(Export::Process, Some(21)), Ok(43));
    }

    #[test]
    fn unknown_module_is_not_found() {
        let registry = ModuleRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.spawn("missing"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
