//! Error types for the ABE scheme.

use attrvault_core::CoreError;
use thiserror::Error;

/// Errors that can occur during ABE operations.
#[derive(Debug, Error)]
pub enum AbeError {
    /// Secret key derivation failed (empty attribute set, degenerate master secret).
    #[error("key generation failed: {0}")]
    KeyGen(String),

    /// The key does not open the ciphertext.
    ///
    /// Carries no detail. An unsatisfied policy, a malformed ciphertext and a
    /// key from another setup all look the same.
    #[error("permission denied")]
    PermissionDenied,

    /// The policy handed to encrypt is empty or malformed.
    #[error("policy error: {0}")]
    Policy(#[from] CoreError),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for ABE operations.
pub type Result<T> = std::result::Result<T, AbeError>;
