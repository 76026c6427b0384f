//! ABI version identifier and host compatibility gate.
//!
//! # Invariants
//! - Wire encoding is `major * 10000 + minor * 100 + patch`.
//! - `minor` and `patch` are each below 100, so encoding is lossless.
//! - A host accepts a module iff majors match and the reported version is at
//!   least the host's minimum.

use std::error::Error;
use std::fmt::{Display, Formatter};

const MAJOR_FACTOR: i32 = 10_000;
const MINOR_FACTOR: i32 = 100;

/// Version this workspace's modules report and its host expects.
pub const CURRENT_ABI_VERSION: AbiVersion = AbiVersion::new(1, 0, 0);

/// Decoded `(major, minor, patch)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbiVersion {
    pub major: u16,
    pub minor: u8,
    pub patch: u8,
}

impl AbiVersion {
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Integer form returned by `get_abi_version`.
    pub const fn encode(self) -> i32 {
        self.major as i32 * MAJOR_FACTOR + self.minor as i32 * MINOR_FACTOR + self.patch as i32
    }

    /// Decodes a reported integer; negative or oversized values are malformed.
    pub fn decode(raw: i32) -> Result<Self, CompatibilityError> {
        if raw < 0 {
            return Err(CompatibilityError::Malformed(raw));
        }
        let major = u16::try_from(raw / MAJOR_FACTOR)
            .map_err(|_| CompatibilityError::Malformed(raw))?;
        // Both remainders are < 100 and therefore fit in u8.
        let minor = ((raw % MAJOR_FACTOR) / MINOR_FACTOR) as u8;
        let patch = (raw % MINOR_FACTOR) as u8;
        Ok(Self::new(major, minor, patch))
    }
}

impl Display for AbiVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Host-side acceptance rule for reported module versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityPolicy {
    pub expected_major: u16,
    pub minimum: AbiVersion,
}

impl CompatibilityPolicy {
    /// Accepts any version of `major` at or above `minimum`.
    pub fn new(expected_major: u16, minimum: AbiVersion) -> Self {
        Self {
            expected_major,
            minimum,
        }
    }

    /// Checks a raw reported version and returns the decoded form on success.
    pub fn check(&self, reported: i32) -> Result<AbiVersion, CompatibilityError> {
        let version = AbiVersion::decode(reported)?;
        if version.major != self.expected_major {
            return Err(CompatibilityError::MajorMismatch {
                expected: self.expected_major,
                reported: version,
            });
        }
        if version < self.minimum {
            return Err(CompatibilityError::BelowMinimum {
                minimum: self.minimum,
                reported: version,
            });
        }
        Ok(version)
    }
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self::new(CURRENT_ABI_VERSION.major, CURRENT_ABI_VERSION)
    }
}

/// Reasons a host refuses to drive a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityError {
    Malformed(i32),
    MajorMismatch {
        expected: u16,
        reported: AbiVersion,
    },
    BelowMinimum {
        minimum: AbiVersion,
        reported: AbiVersion,
    },
}

impl Display for CompatibilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(raw) => write!(f, "malformed ABI version value {raw}"),
            Self::MajorMismatch { expected, reported } => write!(
                f,
                "incompatible ABI version {reported} (expected major {expected})"
            ),
            Self::BelowMinimum { minimum, reported } => write!(
                f,
                "ABI version {reported} is older than required minimum {minimum}"
            ),
        }
    }
}

impl Error for CompatibilityError {}
