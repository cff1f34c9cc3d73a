//! License error types.

use serde::Serialize;
use thiserror::Error;

/// Reason a key was rejected.
///
/// Validation reports these inside a [`ValidationResult`](crate::ValidationResult)
/// rather than returning them as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationFailure {
    /// Key does not match `APX-XXXXX-XXXXX-XXXXX-XXXXX`.
    #[error("invalid license format")]
    InvalidFormat,

    /// Checksum does not match the first three groups.
    #[error("invalid license checksum")]
    InvalidChecksum,

    /// Key is bound to a different domain than the current host.
    #[error("license is bound to another domain (expected {expected}, got {actual})")]
    DomainMismatch {
        /// Domain token carried by the key
        expected: String,
        /// Domain hash of the current host (empty if no host is known)
        actual: String,
    },
}

impl ValidationFailure {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidChecksum => "INVALID_CHECKSUM",
            Self::DomainMismatch { .. } => "DOMAIN_MISMATCH",
        }
    }
}

/// Errors from license operations that touch the outside world.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Key failed validation.
    #[error("license key rejected: {0}")]
    Rejected(#[from] ValidationFailure),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
