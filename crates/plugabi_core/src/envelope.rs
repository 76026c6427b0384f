//! JSON run envelope for one-shot module execution.
//!
//! # Responsibility
//! - Accept `{ "module": <name>, "input": <i32> }` requests.
//! - Run the named module through a full fresh lifecycle.
//! - Always answer with a JSON body: `{ "output": n }` or
//!   `{ "error": msg, "kind": "invalid_request" | "not_found" | "run_failed" }`.
//!
//! # Invariants
//! - Every request gets a new module instance.
//! - Never panics; malformed input becomes an error body.

use crate::abi::version::CompatibilityPolicy;
use crate::host::loaded::{run_once, HostError};
use crate::store::directory::is_valid_module_name;
use crate::store::registry::{ModuleRegistry, RegistryError};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Registered module name, e.g. `double`.
    pub module: String,
    /// Value passed to `process`.
    pub input: i32,
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub output: i32,
}

/// Stable failure class carried by every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    /// Malformed JSON or an unusable module name.
    InvalidRequest,
    /// No module registered under the requested name.
    NotFound,
    /// The module was found but attach or a lifecycle call failed.
    RunFailed,
}

impl RunErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::RunFailed => "run_failed",
        }
    }
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: RunErrorKind,
}

impl From<&RunError> for ErrorResponse {
    fn from(value: &RunError) -> Self {
        Self {
            error: value.to_string(),
            kind: value.kind(),
        }
    }
}

/// Why a run request failed.
#[derive(Debug)]
pub enum RunError {
    MalformedRequest(serde_json::Error),
    InvalidModuleName(String),
    Registry(RegistryError),
    Host(HostError),
}

impl RunError {
    pub fn kind(&self) -> RunErrorKind {
        match self {
            Self::MalformedRequest(_)
            | Self::InvalidModuleName(_)
            | Self::Registry(RegistryError::InvalidName(_) | RegistryError::DuplicateName(_)) => {
                RunErrorKind::InvalidRequest
            }
            Self::Registry(RegistryError::NotFound(_)) => RunErrorKind::NotFound,
            Self::Host(_) => RunErrorKind::RunFailed,
        }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRequest(err) => write!(f, "invalid JSON: {err}"),
            Self::InvalidModuleName(name) if name.is_empty() => {
                write!(f, "module name is required")
            }
            Self::InvalidModuleName(_) => write!(f, "invalid module name"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Host(err) => write!(f, "module run failed: {err}"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedRequest(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Host(err) => Some(err),
            Self::InvalidModuleName(_) => None,
        }
    }
}

impl From<RegistryError> for RunError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<HostError> for RunError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

/// Runs one typed request against a fresh instance.
pub fn run_request(
    registry: &ModuleRegistry,
    policy: &CompatibilityPolicy,
    request: &RunRequest,
) -> Result<RunResponse, RunError> {
    let name = request.module.trim();
    if !is_valid_module_name(name) {
        return Err(RunError::InvalidModuleName(name.to_string()));
    }
    let binding = registry.spawn(name)?;
    let output = run_once(name, binding, policy, request.input)?;
    info!(
        "event=module_run module=envelope status=ok name={} input={} output={}",
        name, request.input, output
    );
    Ok(RunResponse { output })
}

pub fn parse_request(body: &str) -> Result<RunRequest, RunError> {
    serde_json::from_str(body).map_err(RunError::MalformedRequest)
}

/// Parses and runs a JSON request, keeping the typed outcome.
pub fn handle_request(
    registry: &ModuleRegistry,
    policy: &CompatibilityPolicy,
    body: &str,
) -> Result<RunResponse, RunError> {
    parse_request(body).and_then(|request| run_request(registry, policy, &request))
}

/// Serializes an outcome into its JSON body.
pub fn render_outcome(outcome: &Result<RunResponse, RunError>) -> String {
    let serialized = match outcome {
        Ok(response) => serde_json::to_string(response),
        Err(err) => serde_json::to_string(&ErrorResponse::from(err)),
    };
    // Both bodies are plain structs of strings, integers and unit enums.
    serialized.unwrap_or_else(|err| {
        format!("{{\"error\":\"serialization failed: {err}\",\"kind\":\"run_failed\"}}")
    })
}

/// Parses a JSON request, runs it, and serializes the outcome.
pub fn execute_request(
    registry: &ModuleRegistry,
    policy: &CompatibilityPolicy,
    body: &str,
) -> String {
    render_outcome(&handle_request(registry, policy, body))
}
