//! Authenticated symmetric encryption.
//!
//! ChaCha20-Poly1305 with 256-bit keys and 96-bit random nonces. Used for
//! record payloads, for wrapping content keys inside ABE ciphertexts, and for
//! sealing secret key material at rest.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// A 256-bit symmetric key. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_LEN]);

/// The per-record key that encrypts one payload. Generated fresh for every
/// seal and never reused.
pub type ContentKey = EncryptionKey;

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, failing unless it is exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Derive a key from arbitrary key material with domain separation.
    pub fn derive(context: &str, material: &[u8]) -> Self {
        Self(blake3::derive_key(context, material))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Encrypt `plaintext`, authenticating `aad` alongside it.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &EncryptionNonce, aad: &[u8]) -> Result<Vec<u8>> {
        self.cipher()
            .encrypt(Nonce::from_slice(&nonce.0), Payload { msg: plaintext, aad })
            .map_err(|_| CoreError::EncryptionFailed)
    }

    /// Decrypt and authenticate. Any mismatch in key, nonce, data or `aad`
    /// fails with [`CoreError::DecryptionFailed`].
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EncryptionNonce, aad: &[u8]) -> Result<Vec<u8>> {
        self.cipher()
            .decrypt(Nonce::from_slice(&nonce.0), Payload { msg: ciphertext, aad })
            .map_err(|_| CoreError::DecryptionFailed)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionNonce(pub [u8; NONCE_LEN]);

impl EncryptionNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = EncryptionKey::generate();
        let nonce = EncryptionNonce::generate();

        let ciphertext = key.encrypt(b"hello, world!", &nonce, b"ctx").unwrap();
        assert_ne!(ciphertext.as_slice(), b"hello, world!");

        let decrypted = key.decrypt(&ciphertext, &nonce, b"ctx").unwrap();
        assert_eq!(decrypted, b"hello, world!");
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let nonce = EncryptionNonce::generate();
        let ciphertext = EncryptionKey::generate().encrypt(b"secret", &nonce, &[]).unwrap();

        assert!(matches!(
            EncryptionKey::generate().decrypt(&ciphertext, &nonce, &[]),
            Err(CoreError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_decrypt_wrong_aad_fails() {
        let key = EncryptionKey::generate();
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(b"secret", &nonce, b"slot-a").unwrap();

        assert!(key.decrypt(&ciphertext, &nonce, b"slot-b").is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = EncryptionKey::generate();
        let nonce = EncryptionNonce::generate();
        let mut ciphertext = key.encrypt(b"secret", &nonce, &[]).unwrap();
        ciphertext[0] ^= 0x01;

        assert!(key.decrypt(&ciphertext, &nonce, &[]).is_err());
    }

    #[test]
    fn test_derive_is_deterministic_and_separated() {
        let a = EncryptionKey::derive("attrvault test a", b"material");
        let b = EncryptionKey::derive("attrvault test a", b"material");
        let c = EncryptionKey::derive("attrvault test b", b"material");

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn test_from_slice_length() {
        assert!(EncryptionKey::from_slice(&[0u8; 31]).is_err());
        assert!(EncryptionKey::from_slice(&[0u8; 32]).is_ok());
    }

    #[test]
    fn test_debug_redacts() {
        let key = EncryptionKey::from_bytes([0xab; 32]);
        assert_eq!(format!("{key:?}"), "EncryptionKey(..)");
    }
}
