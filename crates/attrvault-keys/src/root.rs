//! Root key and sealing of secret material at rest.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use attrvault_core::{EncryptionKey, EncryptionNonce, KEY_LEN};

use crate::error::{KeyError, Result};
use crate::store::KeySlot;

const SEALED_VERSION: u8 = 1;

/// The 256-bit key that seals secret slots.
///
/// Provisioned out of band (environment, HSM, operator). Never written to a
/// [`KeyStore`](crate::store::KeyStore).
#[derive(Clone)]
pub struct RootKey(EncryptionKey);

impl RootKey {
    /// Generate a new random root key.
    pub fn generate() -> Self {
        Self(EncryptionKey::generate())
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(EncryptionKey::from_bytes(bytes))
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            hex::decode(s.trim()).map_err(|e| KeyError::InvalidKey(format!("root key: {e}")))?,
        );
        let key = EncryptionKey::from_slice(&bytes)
            .map_err(|e| KeyError::InvalidKey(format!("root key: {e}")))?;
        Ok(Self(key))
    }

    /// Seal `plaintext` for storage in `slot`. The slot name is bound as
    /// associated data, so sealed bytes cannot be swapped between slots.
    pub fn seal(&self, slot: KeySlot, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = EncryptionNonce::generate();
        let ciphertext = self.0.encrypt(plaintext, &nonce, slot.name().as_bytes())?;
        let sealed = SealedMaterial {
            version: SEALED_VERSION,
            nonce,
            ciphertext,
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&sealed, &mut buf)
            .map_err(|e| KeyError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Open bytes produced by [`Self::seal`] for the same slot.
    pub fn unseal(&self, slot: KeySlot, bytes: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let sealed: SealedMaterial =
            ciborium::from_reader(bytes).map_err(|_| KeyError::Unseal(slot))?;
        if sealed.version != SEALED_VERSION {
            return Err(KeyError::Unseal(slot));
        }
        self.0
            .decrypt(&sealed.ciphertext, &sealed.nonce, slot.name().as_bytes())
            .map(Zeroizing::new)
            .map_err(|_| KeyError::Unseal(slot))
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootKey(..)")
    }
}

/// On-disk form of a sealed secret slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedMaterial {
    pub version: u8,
    pub nonce: EncryptionNonce,
    pub ciphertext: Vec<u8>,
}
