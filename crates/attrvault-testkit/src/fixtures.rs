//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use attrvault::{ContentService, VaultConfig};
use attrvault_core::AttributeSet;
use attrvault_keys::{
    AuthorityKeys, MemoryKeyStore, PublicMaterial, RootKey, Session, TrustedAuthority,
};

/// Fixed issue time used by fixtures that need a deterministic clock.
pub const FIXTURE_NOW: i64 = 1_700_000_000;

/// A provisioned authority and a content service sharing one memory store.
pub struct TestVault {
    pub store: MemoryKeyStore,
    pub root: RootKey,
    pub authority: TrustedAuthority,
    pub content: ContentService,
}

impl TestVault {
    /// Provision fresh keys with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(VaultConfig::default()).await
    }

    pub async fn with_config(config: VaultConfig) -> Self {
        let store = MemoryKeyStore::new();
        let root = RootKey::generate();
        let keys = AuthorityKeys::provision(&store, &root)
            .await
            .expect("provision test keys");
        let authority = TrustedAuthority::new(keys).with_token_ttl(config.token_ttl_secs);
        let public = PublicMaterial::load(&store)
            .await
            .expect("load public material");
        Self {
            store,
            root,
            authority,
            content: ContentService::new(public, config),
        }
    }

    /// Log a subject in with raw attributes at [`FIXTURE_NOW`].
    pub fn login(&self, subject: &str, raw_attrs: &[&str]) -> Session {
        self.authority
            .login_at(subject, raw_attrs, FIXTURE_NOW)
            .expect("login")
    }

    /// A session holding exactly the given normalized attributes.
    pub fn session_with(&self, subject: &str, attrs: &AttributeSet) -> Session {
        let raw: Vec<&str> = attrs.iter().map(|a| a.as_str()).collect();
        self.login(subject, &raw)
    }
}

/// Attribute set from raw strings. Panics on invalid input.
pub fn attrs(raw: &[&str]) -> AttributeSet {
    AttributeSet::from_raw(raw).expect("valid attributes")
}
