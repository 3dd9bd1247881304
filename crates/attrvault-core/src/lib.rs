//! # AttrVault Core
//!
//! Pure primitives shared by every AttrVault crate: normalized attributes,
//! access policies and the authenticated symmetric cipher.
//!
//! This crate contains no I/O and no pairing arithmetic. It is pure
//! computation over strings, sets and byte buffers.
//!
//! ## Key Types
//!
//! - [`Attribute`] - A normalized capability token (`DOCTOR`, `PATIENT42`)
//! - [`AttributeSet`] - The deduplicated attributes of one session
//! - [`AccessPolicy`] - A monotone boolean formula over attributes
//! - [`EncryptionKey`] - A 256-bit ChaCha20-Poly1305 key
//!
//! ## Policy Building
//!
//! ```rust
//! use attrvault_core::{build_policy, AttributeSet};
//!
//! let attrs = AttributeSet::from_raw(["doctor"]).unwrap();
//! let policy = build_policy(&["doctor", "nurse", "patient"], &attrs, "42").unwrap();
//! assert_eq!(policy.to_string(), "DOCTOR or NURSE or PATIENT or PATIENT42");
//! ```

pub mod attribute;
pub mod cipher;
pub mod error;
pub mod policy;

pub use attribute::{normalize, Attribute, AttributeSet, PATIENT_ROLE};
pub use cipher::{ContentKey, EncryptionKey, EncryptionNonce, KEY_LEN, NONCE_LEN};
pub use error::{CoreError, Result};
pub use policy::{build_policy, AccessPolicy};
