//! Error types for the hybrid envelope.

use attrvault_abe::AbeError;
use attrvault_core::CoreError;
use thiserror::Error;

/// Errors that can occur sealing or opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The caller's key does not satisfy the embedded policy.
    #[error("permission denied")]
    PermissionDenied,

    /// Framing is broken or the payload failed authentication.
    #[error("corrupt ciphertext")]
    CorruptCiphertext,

    /// The policy handed to seal is empty or malformed.
    #[error("policy error: {0}")]
    Policy(#[from] CoreError),

    #[error("key wrapping failed: {0}")]
    Wrap(#[from] AbeError),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
