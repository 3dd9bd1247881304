//! # AttrVault
//!
//! Attribute-based access control for encrypted records.
//!
//! ## Overview
//!
//! Records are encrypted so that only users whose verified attributes
//! satisfy the record's access policy can read them, without a central
//! service mediating every read:
//!
//! - **Policies**: each [`RecordKind`] names the roles that may read it; the
//!   policy engine turns those roles and the writer's attributes into an OR
//!   of attribute literals
//! - **Sealing**: a fresh content key encrypts the payload and is itself
//!   wrapped under the policy with ciphertext-policy ABE
//! - **Sessions**: the [`TrustedAuthority`] turns a verified login into a
//!   signed token and a secret key bound to the user's attributes
//!
//! ## Roles
//!
//! The [`TrustedAuthority`] holds the master secret and the signing key. A
//! [`ContentService`] holds only public material and can run anywhere.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use attrvault::{start_authority, start_content_service, RecordKind, VaultConfig};
//! use attrvault::keys::{MemoryKeyStore, RootKey};
//!
//! async fn example() -> attrvault::Result<()> {
//!     let store = MemoryKeyStore::new();
//!     let root = RootKey::generate();
//!     let config = VaultConfig::default();
//!
//!     let authority = start_authority(&store, &root, &config).await?;
//!     let content = start_content_service(&store, config).await?;
//!
//!     let doctor = authority.login("d1", ["doctor"])?;
//!     let record = content.seal_record(
//!         RecordKind::HealthRecord,
//!         "42",
//!         &doctor.attributes,
//!         b"blood type O+",
//!     )?;
//!
//!     let patient = authority.login("42", ["patient"])?;
//!     let plaintext = content.open_record(&record, &patient.secret_key)?;
//!     assert_eq!(plaintext, b"blood type O+");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `attrvault::core` - Attributes, policies and the symmetric cipher
//! - `attrvault::abe` - The CP-ABE scheme
//! - `attrvault::envelope` - Sealed record framing
//! - `attrvault::keys` - Key storage, authority and tokens

pub mod config;
pub mod error;
pub mod records;
pub mod service;

// Re-export component crates
pub use attrvault_abe as abe;
pub use attrvault_core as core;
pub use attrvault_envelope as envelope;
pub use attrvault_keys as keys;

// Re-export main types for convenience
pub use config::VaultConfig;
pub use error::{Result, VaultError};
pub use records::RecordKind;
pub use service::{open_key_store, start_authority, start_content_service, ContentService};

pub use attrvault_core::{build_policy, AccessPolicy, Attribute, AttributeSet};
pub use attrvault_envelope::Ciphertext;
pub use attrvault_keys::{Session, SessionToken, TrustedAuthority};
