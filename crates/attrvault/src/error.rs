//! Error types for the vault API.

use attrvault_abe::AbeError;
use attrvault_core::CoreError;
use attrvault_envelope::EnvelopeError;
use attrvault_keys::KeyError;
use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Attribute or policy error.
    #[error("policy error: {0}")]
    Core(#[from] CoreError),

    /// ABE scheme error.
    #[error("ABE error: {0}")]
    Abe(#[from] AbeError),

    /// Sealing or opening a record failed.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Key lifecycle or token error.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    #[error("unknown record kind: {0:?}")]
    UnknownRecordKind(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VaultError {
    /// Whether the caller was refused access, as opposed to anything being
    /// broken.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            VaultError::Envelope(EnvelopeError::PermissionDenied)
                | VaultError::Abe(AbeError::PermissionDenied)
        )
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
