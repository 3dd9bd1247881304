//! Content service and authority bootstrap.
//!
//! The content service seals and opens records with public material only.
//! It never sees the master secret or the signing key.

use std::sync::Arc;

use tracing::{info, warn};

use attrvault_abe::SecretKey;
use attrvault_core::{build_policy, AccessPolicy, AttributeSet};
use attrvault_envelope::Ciphertext;
use attrvault_keys::{
    AuthorityKeys, FileKeyStore, KeyStore, PublicMaterial, RootKey, Session, TrustedAuthority,
};

use crate::config::VaultConfig;
use crate::error::Result;
use crate::records::RecordKind;

/// Seals and opens records on behalf of authenticated users.
#[derive(Debug, Clone)]
pub struct ContentService {
    public: PublicMaterial,
    config: Arc<VaultConfig>,
}

impl ContentService {
    pub fn new(public: PublicMaterial, config: VaultConfig) -> Self {
        Self {
            public,
            config: Arc::new(config),
        }
    }

    pub fn public(&self) -> &PublicMaterial {
        &self.public
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Check a session token and return its subject and attributes.
    pub fn authenticate(&self, token: &str) -> Result<(String, AttributeSet)> {
        Ok(self.public.verifier().verify(token)?)
    }

    /// Like [`Self::authenticate`] at an explicit time (Unix seconds).
    pub fn authenticate_at(&self, token: &str, now: i64) -> Result<(String, AttributeSet)> {
        Ok(self.public.verifier().verify_at(token, now)?)
    }

    /// The policy a record of `kind` owned by `owner` gets when written by
    /// a user holding `attrs`.
    pub fn policy_for(
        &self,
        kind: RecordKind,
        owner: &str,
        attrs: &AttributeSet,
    ) -> Result<AccessPolicy> {
        let roles = self.config.required_roles(kind)?;
        Ok(build_policy(roles, attrs, owner)?)
    }

    /// Seal a new record.
    pub fn seal_record(
        &self,
        kind: RecordKind,
        owner: &str,
        attrs: &AttributeSet,
        payload: &[u8],
    ) -> Result<Ciphertext> {
        let policy = self.policy_for(kind, owner, attrs)?;
        Ok(Ciphertext::seal(payload, &policy, self.public.params())?)
    }

    /// Open a record with the caller's secret key.
    pub fn open_record(&self, ciphertext: &Ciphertext, sk: &SecretKey) -> Result<Vec<u8>> {
        Ok(ciphertext.open(sk, self.public.params())?)
    }

    /// Replace a record. The caller must be able to open the existing one;
    /// otherwise the update is refused with the same denial an open gives.
    pub fn reseal_record(
        &self,
        existing: &Ciphertext,
        kind: RecordKind,
        owner: &str,
        session: &Session,
        payload: &[u8],
    ) -> Result<Ciphertext> {
        if let Err(e) = self.open_record(existing, &session.secret_key) {
            warn!(kind = %kind, "record update refused");
            return Err(e);
        }
        self.seal_record(kind, owner, &session.attributes, payload)
    }
}

/// Load the authority from `store`, provisioning it first if the store is
/// empty.
pub async fn start_authority<S: KeyStore + ?Sized>(
    store: &S,
    root: &RootKey,
    config: &VaultConfig,
) -> Result<TrustedAuthority> {
    config.validate()?;
    let keys = if store.is_empty().await? {
        AuthorityKeys::provision(store, root).await?
    } else {
        AuthorityKeys::load(store, root).await?
    };
    Ok(TrustedAuthority::new(keys).with_token_ttl(config.token_ttl_secs))
}

/// Open the file key store named by `config.key_dir`.
pub async fn open_key_store(config: &VaultConfig) -> Result<FileKeyStore> {
    let store = FileKeyStore::open(&config.key_dir).await?;
    info!(dir = %config.key_dir.display(), "opened key store");
    Ok(store)
}

/// Build a content service from the public slots of `store`.
pub async fn start_content_service<S: KeyStore + ?Sized>(
    store: &S,
    config: VaultConfig,
) -> Result<ContentService> {
    config.validate()?;
    let public = PublicMaterial::load(store).await?;
    Ok(ContentService::new(public, config))
}
