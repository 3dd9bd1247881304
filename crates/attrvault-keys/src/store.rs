//! Key store trait: where provisioned key material lives between restarts.
//!
//! The store sees only bytes. Public slots hold plain CBOR; secret slots
//! hold [`SealedMaterial`](crate::root::SealedMaterial) produced under the
//! root key, which the store never holds.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A named location for one piece of key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySlot {
    PublicParameters,
    MasterSecret,
    SigningKey,
    VerifyingKey,
}

impl KeySlot {
    /// Every slot, in provisioning order.
    pub const ALL: [KeySlot; 4] = [
        KeySlot::PublicParameters,
        KeySlot::MasterSecret,
        KeySlot::SigningKey,
        KeySlot::VerifyingKey,
    ];

    /// Stable name, used as file name and as associated data when sealing.
    pub const fn name(&self) -> &'static str {
        match self {
            KeySlot::PublicParameters => "public_parameters",
            KeySlot::MasterSecret => "master_secret",
            KeySlot::SigningKey => "signing_key",
            KeySlot::VerifyingKey => "verifying_key",
        }
    }

    /// Whether the slot only ever holds sealed bytes.
    pub const fn is_secret(&self) -> bool {
        matches!(self, KeySlot::MasterSecret | KeySlot::SigningKey)
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Async interface for key material persistence.
///
/// Persistent implementations must make `put` durable before returning. Writes replace
/// whatever the slot held.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Read a slot. `None` if it was never written.
    async fn get(&self, slot: KeySlot) -> Result<Option<Vec<u8>>>;

    /// Write a slot, replacing any previous content.
    async fn put(&self, slot: KeySlot, bytes: &[u8]) -> Result<()>;

    /// Remove a slot. Removing an empty slot is not an error.
    async fn remove(&self, slot: KeySlot) -> Result<()>;

    /// Whether any slot holds material.
    async fn is_empty(&self) -> Result<bool> {
        for slot in KeySlot::ALL {
            if self.get(slot).await?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
