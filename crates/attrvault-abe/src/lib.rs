//! # AttrVault ABE
//!
//! Ciphertext-policy attribute-based encryption over the BN254 pairing.
//!
//! ## Overview
//!
//! A trusted authority runs [`setup`] once and keeps the [`MasterSecret`].
//! It issues each session a [`SecretKey`] bound to that session's
//! [`AttributeSet`](attrvault_core::AttributeSet). Anyone holding the
//! [`PublicParameters`] can [`encrypt`] a content key under an
//! [`AccessPolicy`](attrvault_core::AccessPolicy); only a key whose
//! attributes satisfy the policy can [`decrypt`] it.
//!
//! ## Key Concepts
//!
//! - **Collusion resistance**: every key is blinded by its own randomness,
//!   so combining two keys never satisfies more than either one alone
//! - **Uniform denial**: decrypt reports [`AbeError::PermissionDenied`] for
//!   every failure and never says which literal was missing
//! - **Setup binding**: keys and wrapped keys carry the [`ParamsId`] of the
//!   setup that produced them
//!
//! ## Usage
//!
//! ```rust
//! use attrvault_abe::{decrypt, encrypt, keygen, setup};
//! use attrvault_core::{AccessPolicy, AttributeSet, ContentKey};
//!
//! let (pp, msk) = setup();
//! let policy = AccessPolicy::parse("doctor or nurse").unwrap();
//! let key = ContentKey::generate();
//! let wrapped = encrypt(&pp, &key, &policy).unwrap();
//!
//! let nurse = keygen(&pp, &msk, &AttributeSet::from_raw(["nurse"]).unwrap()).unwrap();
//! let recovered = decrypt(&pp, &nurse, &wrapped).unwrap();
//! assert_eq!(recovered.as_bytes(), key.as_bytes());
//! ```

pub mod error;
mod group;
pub mod keys;
pub mod scheme;
mod sharing;

pub use error::{AbeError, Result};
pub use keys::{MasterSecret, ParamsId, PublicParameters, SecretKey};
pub use scheme::{decrypt, encrypt, keygen, setup, WrappedKey};
