//! # AttrVault Envelope
//!
//! Hybrid encryption of record payloads.
//!
//! ## Encryption Model
//!
//! Every sealed record uses two layers:
//!
//! 1. **Content Key**: a fresh ChaCha20-Poly1305 key encrypts the payload
//! 2. **Wrapped Key**: the content key is sealed under the record's access
//!    policy with the ABE scheme
//!
//! Opening distinguishes only two failures: [`EnvelopeError::PermissionDenied`]
//! when the caller's key does not satisfy the policy, and
//! [`EnvelopeError::CorruptCiphertext`] when the bytes are not a valid
//! envelope or fail authentication.
//!
//! ## Usage
//!
//! ```rust
//! use attrvault_abe::{keygen, setup};
//! use attrvault_core::{AccessPolicy, AttributeSet};
//! use attrvault_envelope::{open, seal};
//!
//! let (pp, msk) = setup();
//! let policy = AccessPolicy::parse("doctor or patient42").unwrap();
//! let ct = seal(b"allergy: penicillin", &policy, &pp).unwrap();
//!
//! let sk = keygen(&pp, &msk, &AttributeSet::from_raw(["patient42"]).unwrap()).unwrap();
//! assert_eq!(open(&ct, &sk, &pp).unwrap(), b"allergy: penicillin");
//! ```

pub mod envelope;
pub mod error;

pub use envelope::{open, seal, Ciphertext, FORMAT_VERSION};
pub use error::{EnvelopeError, Result};
