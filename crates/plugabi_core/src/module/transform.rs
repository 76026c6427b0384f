//! Pluggable payload logic run inside the lifecycle guard.

/// Deterministic payload computation for one module.
///
/// Implementations must be pure functions of `input`: no I/O, no blocking,
/// bounded steps. The surrounding [`ModuleInstance`](super::ModuleInstance)
/// owns state checks, range safety and usage accounting.
pub trait Transform {
    /// Domain constraint on the input; `false` reports `InvalidInput`.
    fn accepts(&self, input: i32) -> bool;

    /// Computes the raw result. `None` means the value is unrepresentable
    /// (overflow) and reports `Internal`.
    fn compute(&self, input: i32) -> Option<i32>;
}

/// Reference transform: `input * 2 + 1` over non-negative inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleIncrement;

impl Transform for DoubleIncrement {
    fn accepts(&self, input: i32) -> bool {
        input >= 0
    }

    fn compute(&self, input: i32) -> Option<i32> {
        input.checked_mul(2)?.checked_add(1)
    }
}
