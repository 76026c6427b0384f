//! Integer result channel shared by every module export.
//!
//! # Responsibility
//! - Define the closed error-code set and its stable numeric values.
//! - Encode typed results into the `i32` channel at the export edge.
//! - Decode the channel back into typed results on the host side.
//!
//! # Invariants
//! - `0` is success without payload; every error code is strictly negative.
//! - Codes are never renumbered; new kinds are additive under minor bumps.
//! - A payload is always `>= 0`, so payload and error ranges never overlap.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Success status for lifecycle exports.
pub const ABI_SUCCESS: i32 = 0;

/// Closed set of failures a module reports through the integer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AbiError {
    /// Operation invoked while the instance is not `Ready`.
    NotInitialized,
    /// `init` invoked while the instance is already `Ready`.
    AlreadyInitialized,
    /// Input fails the payload's domain validation.
    InvalidInput,
    /// Internal invariant violation, e.g. a result colliding with error codes.
    Internal,
}

impl AbiError {
    pub const ALL: [AbiError; 4] = [
        Self::NotInitialized,
        Self::AlreadyInitialized,
        Self::InvalidInput,
        Self::Internal,
    ];

    /// Stable negative code carried over the channel.
    pub const fn code(self) -> i32 {
        match self {
            Self::NotInitialized => -1,
            Self::AlreadyInitialized => -2,
            Self::InvalidInput => -3,
            Self::Internal => -4,
        }
    }

    /// Maps a raw code back to a known error kind.
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::NotInitialized),
            -2 => Some(Self::AlreadyInitialized),
            -3 => Some(Self::InvalidInput),
            -4 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Symbolic name used in host diagnostics.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NotInitialized => "ABI_ERROR_NOT_INITIALIZED",
            Self::AlreadyInitialized => "ABI_ERROR_ALREADY_INITIALIZED",
            Self::InvalidInput => "ABI_ERROR_INVALID_INPUT",
            Self::Internal => "ABI_ERROR_INTERNAL",
        }
    }
}

impl Display for AbiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "module is not initialized"),
            Self::AlreadyInitialized => write!(f, "module is already initialized"),
            Self::InvalidInput => write!(f, "input fails domain validation"),
            Self::Internal => write!(f, "internal module invariant violated"),
        }
    }
}

impl Error for AbiError {}

/// Encodes a lifecycle outcome (`init`/`cleanup`) into the channel.
pub fn encode_status(result: Result<(), AbiError>) -> i32 {
    match result {
        Ok(()) => ABI_SUCCESS,
        Err(err) => err.code(),
    }
}

/// Encodes a `process` outcome into the channel.
///
/// A negative payload would be indistinguishable from an error code, so it is
/// reported as [`AbiError::Internal`].
pub fn encode_payload(result: Result<i32, AbiError>) -> i32 {
    match result {
        Ok(value) if value >= 0 => value,
        Ok(_) => AbiError::Internal.code(),
        Err(err) => err.code(),
    }
}

/// Host-side view of a failed export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFailure {
    /// One of the closed-set error kinds.
    Known(AbiError),
    /// A negative code outside the closed set (newer or broken module).
    UnknownCode(i32),
    /// A lifecycle export returned a positive value instead of `0`.
    UnexpectedStatus(i32),
}

impl CallFailure {
    /// Raw value the module returned.
    pub fn raw(self) -> i32 {
        match self {
            Self::Known(err) => err.code(),
            Self::UnknownCode(code) | Self::UnexpectedStatus(code) => code,
        }
    }

    pub fn abi_error(self) -> Option<AbiError> {
        match self {
            Self::Known(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for CallFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(err) => write!(f, "error code {} ({})", err.code(), err.symbol()),
            Self::UnknownCode(code) => write!(f, "unknown error code {code}"),
            Self::UnexpectedStatus(code) => write!(f, "unexpected status {code}"),
        }
    }
}

impl Error for CallFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Known(err) => Some(err),
            Self::UnknownCode(_) | Self::UnexpectedStatus(_) => None,
        }
    }
}

/// Decodes a lifecycle status: only `0` is success.
pub fn decode_status(raw: i32) -> Result<(), CallFailure> {
    match raw {
        ABI_SUCCESS => Ok(()),
        code if code < 0 => Err(decode_negative(code)),
        other => Err(CallFailure::UnexpectedStatus(other)),
    }
}

/// Decodes a payload: any non-negative value is a result.
pub fn decode_payload(raw: i32) -> Result<i32, CallFailure> {
    if raw >= 0 {
        Ok(raw)
    } else {
        Err(decode_negative(raw))
    }
}

fn decode_negative(code: i32) -> CallFailure {
    match AbiError::from_code(code) {
        Some(err) => CallFailure::Known(err),
        None => CallFailure::UnknownCode(code),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_payload, decode_status, encode_payload, encode_status, AbiError, CallFailure,
    };

    #[test]
    fn codes_are_stable_and_negative() {
        let codes: Vec<i32> = AbiError::ALL.iter().map(|err| err.code()).collect();
        assert_eq!(codes, vec![-1, -2, -3, -4]);
        for err in AbiError::ALL {
            assert_eq!(AbiError::from_code(err.code()), Some(err));
        }
        assert_eq!(AbiError::from_code(0), None);
        assert_eq!(AbiError::from_code(-5), None);
    }

    #[test]
    fn negative_payload_is_remapped_to_internal() {
        assert_eq!(encode_payload(Ok(-7)), -4);
        assert_eq!(encode_payload(Ok(0)), 0);
        assert_eq!(encode_payload(Err(AbiError::InvalidInput)), -3);
    }

    #[test]
    fn status_encoding_uses_zero_for_success() {
        assert_eq!(encode_status(Ok(())), 0);
        assert_eq!(encode_status(Err(AbiError::AlreadyInitialized)), -2);
    }

    #[test]
    fn decode_distinguishes_known_unknown_and_unexpected() {
        assert_eq!(decode_payload(21), Ok(21));
        assert_eq!(
            decode_payload(-1),
            Err(CallFailure::Known(AbiError::NotInitialized))
        );
        assert_eq!(decode_payload(-99), Err(CallFailure::UnknownCode(-99)));
        assert_eq!(decode_status(0), Ok(()));
        assert_eq!(decode_status(3), Err(CallFailure::UnexpectedStatus(3)));
        assert_eq!(CallFailure::UnknownCode(-99).raw(), -99);
    }
}
