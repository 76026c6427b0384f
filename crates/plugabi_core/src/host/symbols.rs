//! Binding over C-ABI function pointers resolved by symbol name.

use crate::host::binding::{check_arity, BindingError, Export, ModuleBinding};
use std::collections::BTreeMap;

/// `() -> i32` export.
pub type NullaryExport = extern "C" fn() -> i32;
/// `(i32) -> i32` export.
pub type UnaryExport = extern "C" fn(i32) -> i32;

#[derive(Debug, Clone, Copy)]
enum Entry {
    Nullary(NullaryExport),
    Unary(UnaryExport),
}

/// Export table populated by whatever loader resolved the module symbols.
///
/// Entries are keyed by exact symbol name; unknown names are ignored so a
/// newer module exporting extra symbols still binds.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<Export, Entry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a zero-argument export. Returns `false` for unknown or
    /// signature-mismatched names.
    pub fn insert_nullary(&mut self, symbol: &str, function: NullaryExport) -> bool {
        match Export::from_symbol(symbol) {
            Some(export) if !export.takes_input() => {
                self.entries.insert(export, Entry::Nullary(function));
                true
            }
            _ => false,
        }
    }

    /// Registers a one-argument export.
    pub fn insert_unary(&mut self, symbol: &str, function: UnaryExport) -> bool {
        match Export::from_symbol(symbol) {
            Some(export) if export.takes_input() => {
                self.entries.insert(export, Entry::Unary(function));
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ModuleBinding for SymbolTable {
    fn has_export(&self, export: Export) -> bool {
        self.entries.contains_key(&export)
    }

    fn call(&mut self, export: Export, input: Option<i32>) -> Result<i32, BindingError> {
        let input = check_arity(export, input)?;
        let entry = self
            .entries
            .get(&export)
            .ok_or(BindingError::MissingExport(export))?;
        match (entry, input) {
            (Entry::Nullary(function), None) => Ok(function()),
            (Entry::Unary(function), Some(value)) => Ok(function(value)),
            (Entry::Nullary(_), Some(_)) => Err(BindingError::ArityMismatch {
                export,
                expected: 0,
            }),
            (Entry::Unary(_), None) => Err(BindingError::ArityMismatch {
                export,
                expected: 1,
            }),
        }
    }
}
