//! Error types for AttrVault Core.

use thiserror::Error;

/// Errors raised by attribute, policy and cipher operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid attribute: {0:?}")]
    InvalidAttribute(String),

    /// No required role resolved to a literal. Encrypting under a vacuous
    /// policy is never allowed.
    #[error("access policy is empty")]
    EmptyPolicy,

    #[error("invalid access policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid key length: expected 32, got {0}")]
    InvalidKeyLength(usize),

    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD authentication failed: wrong key or tampered data.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
