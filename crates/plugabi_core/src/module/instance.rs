//! Per-instance lifecycle guard.
//!
//! # Responsibility
//! - Own the lifecycle flag and usage counter of one module instance.
//! - Run every payload through the same guard sequence.
//!
//! # Invariants
//! - Only host calls transition state; a failed call never mutates state.
//! - `process` order: state check, input validation, compute, range check,
//!   counter update.
//! - `cleanup` fails only when the instance was never initialized.

use crate::abi::code::AbiError;
use crate::module::transform::Transform;

/// Lifecycle state of one module instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Ready,
}

/// One host-owned module instance wrapping payload logic `T`.
#[derive(Debug, Clone, Default)]
pub struct ModuleInstance<T> {
    transform: T,
    state: LifecycleState,
    ever_initialized: bool,
    call_count: u32,
}

impl<T: Transform> ModuleInstance<T> {
    /// Creates a fresh instance in `Uninitialized`.
    pub const fn new(transform: T) -> Self {
        Self {
            transform,
            state: LifecycleState::Uninitialized,
            ever_initialized: false,
            call_count: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Ready
    }

    /// Successful `process` calls since the last `init`.
    pub fn call_count(&self) -> u32 {
        self.call_count
    }

    /// `Uninitialized -> Ready`, resetting the usage counter.
    pub fn init(&mut self) -> Result<(), AbiError> {
        if self.is_initialized() {
            return Err(AbiError::AlreadyInitialized);
        }
        self.state = LifecycleState::Ready;
        self.ever_initialized = true;
        self.call_count = 0;
        Ok(())
    }

    /// Runs the payload under the guard sequence.
    pub fn process(&mut self, input: i32) -> Result<i32, AbiError> {
        if !self.is_initialized() {
            return Err(AbiError::NotInitialized);
        }
        if !self.transform.accepts(input) {
            return Err(AbiError::InvalidInput);
        }
        let result = match self.transform.compute(input) {
            Some(value) if value >= 0 => value,
            _ => return Err(AbiError::Internal),
        };
        self.call_count = self.call_count.saturating_add(1);
        Ok(result)
    }

    /// `Ready -> Uninitialized`; repeated calls after an init are no-ops.
    pub fn cleanup(&mut self) -> Result<(), AbiError> {
        if !self.ever_initialized {
            return Err(AbiError::NotInitialized);
        }
        self.state = LifecycleState::Uninitialized;
        self.call_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleState, ModuleInstance};
    use crate::abi::code::AbiError;
    use crate::module::transform::{DoubleIncrement, Transform};

    struct Negate;

    impl Transform for Negate {
        fn accepts(&self, _input: i32) -> bool {
            true
        }

        fn compute(&self, input: i32) -> Option<i32> {
            input.checked_neg()
        }
    }

    #[test]
    fn fresh_instance_is_uninitialized() {
        let instance = ModuleInstance::new(DoubleIncrement);
        assert_eq!(instance.state(), LifecycleState::Uninitialized);
        assert_eq!(instance.call_count(), 0);
    }

    #[test]
    fn state_check_runs_before_input_validation() {
        let mut instance = ModuleInstance::new(DoubleIncrement);
        assert_eq!(instance.process(-5), Err(AbiError::NotInitialized));
    }

    #[test]
    fn negative_result_is_internal_and_not_counted() {
        let mut instance = ModuleInstance::new(Negate);
        instance.init().expect("init");
        assert_eq!(instance.process(3), Err(AbiError::Internal));
        assert_eq!(instance.process(-3), Ok(3));
        assert_eq!(instance.call_count(), 1);
    }

    #[test]
    fn overflow_is_internal() {
        let mut instance = ModuleInstance::new(DoubleIncrement);
        instance.init().expect("init");
        assert_eq!(instance.process(i32::MAX), Err(AbiError::Internal));
        assert_eq!(instance.call_count(), 0);
    }

    #[test]
    fn failed_init_keeps_counter() {
        let mut instance = ModuleInstance::new(DoubleIncrement);
        instance.init().expect("init");
        instance.process(1).expect("process");
        assert_eq!(instance.init(), Err(AbiError::AlreadyInitialized));
        assert_eq!(instance.call_count(), 1);
    }
}
