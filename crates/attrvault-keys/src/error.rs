//! Error types for key lifecycle and token operations.

use attrvault_abe::AbeError;
use attrvault_core::CoreError;
use thiserror::Error;

use crate::store::KeySlot;

/// Errors that can occur managing keys and tokens.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The token is past its expiry.
    #[error("token expired")]
    Expired,

    /// The token signature does not verify under the authority's key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token is not a well-formed compact token.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Provisioning would overwrite existing key material.
    #[error("key material already provisioned")]
    AlreadyProvisioned,

    /// A required slot is empty.
    #[error("key slot {0} is not provisioned")]
    NotProvisioned(KeySlot),

    /// Sealed material failed authentication (wrong root key or tampering).
    #[error("sealed key material in slot {0} could not be opened")]
    Unseal(KeySlot),

    /// Stored key material does not decode.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ABE error: {0}")]
    Abe(#[from] AbeError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;
