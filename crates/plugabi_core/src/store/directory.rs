//! Filesystem module store.
//!
//! # Responsibility
//! - Map a module name to its compiled binary path.
//! - Reject names that could escape the store root.
//!
//! # Invariants
//! - Layout is `<root>/<name>/<name>.wasm` for every store kind.
//! - The store never modifies or caches module files.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

const MODULE_FILE_EXTENSION: &str = "wasm";

static MODULE_NAME_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").ok());

/// Returns whether `name` is safe to embed in a store path.
pub fn is_valid_module_name(name: &str) -> bool {
    MODULE_NAME_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(name))
}

/// Resolution errors.
#[derive(Debug)]
pub enum StoreError {
    InvalidName(String),
    NotFound(String),
    Io { path: PathBuf, source: io::Error },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid module name: {name}"),
            Self::NotFound(name) => write!(f, "module not found: {name}"),
            Self::Io { path, source } => {
                write!(f, "failed to access module `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidName(_) | Self::NotFound(_) => None,
        }
    }
}

/// Resolves module names to loadable binary paths.
pub trait ModuleStore {
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError>;
}

/// Where a directory store's root comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Development tree checked out next to the host.
    Local,
    /// Dataset volume mounted into the host (e.g. a cluster cache mount).
    Mounted,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Mounted => "mounted",
        }
    }
}

/// Store backed by one directory of `<name>/<name>.wasm` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    kind: StoreKind,
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(kind: StoreKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreKind::Local, root)
    }

    pub fn mounted(root: impl Into<PathBuf>) -> Self {
        Self::new(StoreKind::Mounted, root)
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn module_path(&self, name: &str) -> PathBuf {
        self.root
            .join(name)
            .join(format!("{name}.{MODULE_FILE_EXTENSION}"))
    }
}

impl ModuleStore for DirectoryStore {
    fn resolve(&self, name: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_module_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let path = self.module_path(name);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(StoreError::NotFound(name.to_string())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
