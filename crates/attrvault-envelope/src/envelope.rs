//! Sealed record envelope.
//!
//! Wire layout:
//!
//! ```text
//! version (1) | wrapped_len (u32 BE) | wrapped key (CBOR) | nonce (12) | payload + tag
//! ```
//!
//! Everything before the nonce is the header. The header is authenticated
//! as associated data of the payload, so a payload cannot be moved under a
//! different wrapped key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use attrvault_abe::{AbeError, PublicParameters, SecretKey, WrappedKey};
use attrvault_core::{AccessPolicy, ContentKey, EncryptionNonce, NONCE_LEN};

use crate::error::{EnvelopeError, Result};

/// Current envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Poly1305 tag length.
const TAG_LEN: usize = 16;

/// An encrypted record: a policy-wrapped content key plus the payload it
/// encrypts.
#[derive(Clone)]
pub struct Ciphertext {
    /// `version | wrapped_len | wrapped`, exactly as framed.
    header: Bytes,
    wrapped: WrappedKey,
    nonce: EncryptionNonce,
    payload: Bytes,
}

impl Ciphertext {
    /// Encrypt `plaintext` so that only keys satisfying `policy` can open it.
    pub fn seal(plaintext: &[u8], policy: &AccessPolicy, pp: &PublicParameters) -> Result<Self> {
        policy.validate()?;

        let content_key = ContentKey::generate();
        let wrapped = attrvault_abe::encrypt(pp, &content_key, policy)?;
        let header = frame_header(&wrapped.to_bytes()?)?;

        let nonce = EncryptionNonce::generate();
        let payload = content_key
            .encrypt(plaintext, &nonce, &header)
            .map_err(|_| AbeError::EncryptionFailed)?;

        debug!(size = plaintext.len(), "sealed record");
        Ok(Self {
            header,
            wrapped,
            nonce,
            payload: Bytes::from(payload),
        })
    }

    /// Decrypt with the caller's secret key.
    pub fn open(&self, sk: &SecretKey, pp: &PublicParameters) -> Result<Vec<u8>> {
        let content_key = attrvault_abe::decrypt(pp, sk, &self.wrapped).map_err(|_| {
            debug!("record open denied");
            EnvelopeError::PermissionDenied
        })?;

        content_key
            .decrypt(&self.payload, &self.nonce, &self.header)
            .map_err(|_| EnvelopeError::CorruptCiphertext)
    }

    /// The policy the record was sealed under. Readable without any key.
    pub fn policy(&self) -> &AccessPolicy {
        self.wrapped.policy()
    }

    /// Serialize to the binary wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.header.len() + NONCE_LEN + self.payload.len());
        buf.put_slice(&self.header);
        buf.put_slice(self.nonce.as_bytes());
        buf.put_slice(&self.payload);
        buf.to_vec()
    }

    /// Parse the binary wire layout. Any structural problem is
    /// [`EnvelopeError::CorruptCiphertext`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        if buf.remaining() < 5 {
            return Err(EnvelopeError::CorruptCiphertext);
        }
        if buf.get_u8() != FORMAT_VERSION {
            return Err(EnvelopeError::CorruptCiphertext);
        }
        let wrapped_len = buf.get_u32() as usize;
        if buf.remaining() < wrapped_len + NONCE_LEN + TAG_LEN {
            return Err(EnvelopeError::CorruptCiphertext);
        }

        let header_len = 5 + wrapped_len;
        let header = Bytes::copy_from_slice(&bytes[..header_len]);
        let wrapped = WrappedKey::from_bytes(&buf[..wrapped_len])
            .map_err(|_| EnvelopeError::CorruptCiphertext)?;
        buf.advance(wrapped_len);

        let mut nonce = [0u8; NONCE_LEN];
        buf.copy_to_slice(&mut nonce);

        Ok(Self {
            header,
            wrapped,
            nonce: EncryptionNonce::from_bytes(nonce),
            payload: Bytes::copy_from_slice(buf),
        })
    }

    /// Standard base64 of [`Self::to_bytes`], for text transports.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|_| EnvelopeError::CorruptCiphertext)?;
        Self::from_bytes(&bytes)
    }

    /// Length of the encrypted payload including its tag.
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ciphertext")
            .field("wrapped", &self.wrapped)
            .field("payload_len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

fn frame_header(wrapped: &[u8]) -> Result<Bytes> {
    let len = u32::try_from(wrapped.len()).map_err(|_| EnvelopeError::CorruptCiphertext)?;
    let mut buf = BytesMut::with_capacity(5 + wrapped.len());
    buf.put_u8(FORMAT_VERSION);
    buf.put_u32(len);
    buf.put_slice(wrapped);
    Ok(buf.freeze())
}

/// Seal `plaintext` under `policy`.
pub fn seal(plaintext: &[u8], policy: &AccessPolicy, pp: &PublicParameters) -> Result<Ciphertext> {
    Ciphertext::seal(plaintext, policy, pp)
}

/// Open a sealed record with the caller's secret key.
pub fn open(ciphertext: &Ciphertext, sk: &SecretKey, pp: &PublicParameters) -> Result<Vec<u8>> {
    ciphertext.open(sk, pp)
}
