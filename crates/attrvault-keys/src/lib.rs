//! # AttrVault Keys
//!
//! Key lifecycle for the trusted authority and the services that rely on it.
//!
//! ## Overview
//!
//! - [`AuthorityKeys`] provisions the ABE setup and the token signing
//!   keypair once, persists them through a [`KeyStore`], and loads them
//!   back. Secret slots are sealed under a [`RootKey`] that never touches
//!   the store.
//! - [`TrustedAuthority`] owns the unsealed secrets and issues per-session
//!   [`SecretKey`](attrvault_abe::SecretKey)s and [`SessionToken`]s.
//! - [`PublicMaterial`] and [`TokenVerifier`] are all a content service
//!   needs: public parameters and the verifying key.
//!
//! ## Tokens
//!
//! Tokens expire exactly [`DEFAULT_TOKEN_TTL`] seconds after issue unless
//! the authority is configured otherwise. They are never renewed.

pub mod authority;
pub mod error;
pub mod file;
pub mod memory;
pub mod root;
pub mod signing;
pub mod store;
pub mod token;

pub use authority::{AuthorityKeys, PublicMaterial, Session, TrustedAuthority};
pub use error::{KeyError, Result};
pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;
pub use root::{RootKey, SealedMaterial};
pub use signing::{AuthorityPublicKey, SigningKeypair};
pub use store::{KeySlot, KeyStore};
pub use token::{Claims, SessionToken, TokenVerifier, DEFAULT_TOKEN_TTL};
