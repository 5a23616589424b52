// Error Types
// Public error taxonomy for every cryptor operation, plus numeric status codes

use thiserror::Error;

use crate::rsa::bigint::EngineError;

/// Errors returned by every public operation.
///
/// This is a closed set. Failures inside the big-number engine never leak
/// through directly; they are folded into one of these variants at the
/// operation boundary.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptorError {
    /// A caller-supplied argument is invalid: missing key, wrong key
    /// variant, unsupported padding or digest, size mismatch.
    #[error("invalid parameter")]
    Param,

    /// Malformed or cryptographically inconsistent data: bad key package,
    /// padding failure, invalid signature structure, engine rejection.
    #[error("decode error")]
    Decode,

    /// The output buffer is too small. Re-invoke with at least `required`
    /// bytes.
    #[error("buffer too small: {required} bytes required")]
    BufferTooSmall { required: usize },

    /// Allocation failed, or a raw block had the wrong size.
    #[error("memory failure")]
    MemoryFailure,
}

/// Result type for cryptor operations
pub type Result<T> = std::result::Result<T, CryptorError>;

/// Numeric status codes for callers that speak in return codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CryptorStatus {
    Success = 0,
    ParamError = -4300,
    BufferTooSmall = -4301,
    MemoryFailure = -4302,
    DecodeError = -4304,
}

impl CryptorError {
    /// Numeric status code for this error.
    pub fn status(&self) -> CryptorStatus {
        match self {
            CryptorError::Param => CryptorStatus::ParamError,
            CryptorError::Decode => CryptorStatus::DecodeError,
            CryptorError::BufferTooSmall { .. } => CryptorStatus::BufferTooSmall,
            CryptorError::MemoryFailure => CryptorStatus::MemoryFailure,
        }
    }
}

impl CryptorStatus {
    /// Raw integer value of the status.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Collapse an operation result into its status code.
pub fn status_of<T>(result: &Result<T>) -> CryptorStatus {
    match result {
        Ok(_) => CryptorStatus::Success,
        Err(e) => e.status(),
    }
}

/// Engine failures never reach callers in detail: every one of them is a
/// decode error at the operation boundary.
impl From<EngineError> for CryptorError {
    fn from(_: EngineError) -> Self {
        CryptorError::Decode
    }
}

impl From<std::collections::TryReserveError> for CryptorError {
    fn from(_: std::collections::TryReserveError) -> Self {
        CryptorError::MemoryFailure
    }
}
