//! Host configuration read from environment variables.
//!
//! # Responsibility
//! - Resolve store location, version policy and logging settings once.
//! - Keep lookup injectable so tests never mutate process environment.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Set-but-invalid variables are errors, never silently defaulted.

use crate::abi::version::{
    AbiVersion, CompatibilityError, CompatibilityPolicy, CURRENT_ABI_VERSION,
};
use crate::logging::default_log_level;
use crate::store::directory::{DirectoryStore, StoreKind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_STORE: &str = "PLUGABI_STORE";
pub const ENV_STORE_ROOT: &str = "PLUGABI_STORE_ROOT";
pub const ENV_EXPECTED_MAJOR: &str = "PLUGABI_EXPECTED_MAJOR";
pub const ENV_MIN_VERSION: &str = "PLUGABI_MIN_VERSION";
pub const ENV_LOG_LEVEL: &str = "PLUGABI_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PLUGABI_LOG_DIR";

const DEFAULT_LOCAL_ROOT: &str = "./plugins";
const DEFAULT_MOUNTED_ROOT: &str = "/mnt/plugins";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedStore(String),
    InvalidNumber { key: &'static str, value: String },
    InvalidMinimum(CompatibilityError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedStore(value) => {
                write!(f, "unsupported store `{value}`; expected local|mounted")
            }
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got `{value}`")
            }
            Self::InvalidMinimum(err) => write!(f, "{ENV_MIN_VERSION} is invalid: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMinimum(err) => Some(err),
            Self::UnsupportedStore(_) | Self::InvalidNumber { .. } => None,
        }
    }
}

/// Resolved host settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub store_kind: StoreKind,
    pub store_root: PathBuf,
    pub policy: CompatibilityPolicy,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            store_kind: StoreKind::Local,
            store_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            policy: CompatibilityPolicy::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl HostConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let store_kind = match get(ENV_STORE).as_deref() {
            None | Some("local") => StoreKind::Local,
            Some("mounted") => StoreKind::Mounted,
            Some(other) => return Err(ConfigError::UnsupportedStore(other.to_string())),
        };
        let store_root = get(ENV_STORE_ROOT)
            .map(PathBuf::from)
            .unwrap_or_else(|| match store_kind {
                StoreKind::Local => PathBuf::from(DEFAULT_LOCAL_ROOT),
                StoreKind::Mounted => PathBuf::from(DEFAULT_MOUNTED_ROOT),
            });

        let expected_major = match get(ENV_EXPECTED_MAJOR) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
                key: ENV_EXPECTED_MAJOR,
                value: raw.clone(),
            })?,
            None => CURRENT_ABI_VERSION.major,
        };
        let minimum = match get(ENV_MIN_VERSION) {
            Some(raw) => {
                let encoded = raw.parse::<i32>().map_err(|_| ConfigError::InvalidNumber {
                    key: ENV_MIN_VERSION,
                    value: raw.clone(),
                })?;
                AbiVersion::decode(encoded).map_err(ConfigError::InvalidMinimum)?
            }
            None => CURRENT_ABI_VERSION,
        };

        Ok(Self {
            store_kind,
            store_root,
            policy: CompatibilityPolicy::new(expected_major, minimum),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR),
        })
    }

    pub fn store(&self) -> DirectoryStore {
        DirectoryStore::new(self.store_kind, self.store_root.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, HostConfig, ENV_EXPECTED_MAJOR, ENV_LOG_DIR, ENV_MIN_VERSION, ENV_STORE,
        ENV_STORE_ROOT,
    };
    use crate::abi::version::AbiVersion;
    use crate::store::directory::StoreKind;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = HostConfig::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.store().root(), PathBuf::from("./plugins").as_path());
    }

    #[test]
    fn mounted_store_uses_mount_default() {
        let config = HostConfig::from_lookup(lookup(&[(ENV_STORE, "mounted")])).expect("config");
        assert_eq!(config.store_kind, StoreKind::Mounted);
        assert_eq!(config.store_root, PathBuf::from("/mnt/plugins"));

        let config = HostConfig::from_lookup(lookup(&[
            (ENV_STORE, "mounted"),
            (ENV_STORE_ROOT, "/data/plugins"),
            (ENV_LOG_DIR, " "),
        ]))
        .expect("config");
        assert_eq!(config.store_root, PathBuf::from("/data/plugins"));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn parses_version_policy() {
        let config = HostConfig::from_lookup(lookup(&[
            (ENV_EXPECTED_MAJOR, "2"),
            (ENV_MIN_VERSION, "20100"),
        ]))
        .expect("config");
        assert_eq!(config.policy.expected_major, 2);
        assert_eq!(config.policy.minimum, AbiVersion::new(2, 1, 0));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            HostConfig::from_lookup(lookup(&[(ENV_STORE, "s3")])),
            Err(ConfigError::UnsupportedStore(_))
        ));
        assert!(matches!(
            HostConfig::from_lookup(lookup(&[(ENV_EXPECTED_MAJOR, "one")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            HostConfig::from_lookup(lookup(&[(ENV_MIN_VERSION, "-5")])),
            Err(ConfigError::InvalidMinimum(_))
        ));
    }
}
