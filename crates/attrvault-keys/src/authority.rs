//! The trusted authority: provisioning, loading and issuance.
//!
//! Two roles load key material from the same [`KeyStore`]:
//!
//! - the authority loads everything with [`AuthorityKeys::load`], which
//!   needs the [`RootKey`] to unseal the master secret and signing key
//! - content services load only [`PublicMaterial`], which needs no secret

use std::sync::Arc;

use tracing::{info, warn};

use attrvault_abe::{keygen, setup, MasterSecret, PublicParameters, SecretKey};
use attrvault_core::AttributeSet;

use crate::error::{KeyError, Result};
use crate::root::RootKey;
use crate::signing::{AuthorityPublicKey, SigningKeypair};
use crate::store::{KeySlot, KeyStore};
use crate::token::{now_secs, Claims, SessionToken, TokenVerifier, DEFAULT_TOKEN_TTL};

/// Public parameters and the token verifying key.
#[derive(Debug, Clone)]
pub struct PublicMaterial {
    params: Arc<PublicParameters>,
    verifying_key: AuthorityPublicKey,
}

impl PublicMaterial {
    pub fn new(params: PublicParameters, verifying_key: AuthorityPublicKey) -> Self {
        Self {
            params: Arc::new(params),
            verifying_key,
        }
    }

    /// Load the public slots only.
    pub async fn load<S: KeyStore + ?Sized>(store: &S) -> Result<Self> {
        let params = read_slot(store, KeySlot::PublicParameters).await?;
        let params = PublicParameters::from_bytes(&params)
            .map_err(|e| KeyError::InvalidKey(format!("public parameters: {e}")))?;

        let verifying_key = read_slot(store, KeySlot::VerifyingKey).await?;
        let verifying_key: [u8; 32] = verifying_key
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidKey("verifying key must be 32 bytes".into()))?;

        Ok(Self::new(params, AuthorityPublicKey::from_bytes(verifying_key)))
    }

    pub fn params(&self) -> &PublicParameters {
        &self.params
    }

    /// Shared handle to the public parameters.
    pub fn params_arc(&self) -> Arc<PublicParameters> {
        Arc::clone(&self.params)
    }

    pub fn verifying_key(&self) -> &AuthorityPublicKey {
        &self.verifying_key
    }

    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(self.verifying_key)
    }
}

/// Everything the authority holds: public material plus the unsealed
/// master secret and signing key.
pub struct AuthorityKeys {
    public: PublicMaterial,
    master: MasterSecret,
    signing: SigningKeypair,
}

impl AuthorityKeys {
    /// One-time setup. Fails with [`KeyError::AlreadyProvisioned`] if the
    /// store holds any key material.
    pub async fn provision<S: KeyStore + ?Sized>(store: &S, root: &RootKey) -> Result<Self> {
        if !store.is_empty().await? {
            return Err(KeyError::AlreadyProvisioned);
        }
        let keys = Self::write_fresh(store, root).await?;
        info!(verifying_key = ?keys.public.verifying_key, "provisioned authority keys");
        Ok(keys)
    }

    /// Replace existing key material with a fresh setup. Every secret key
    /// and token issued under the old material stops working.
    pub async fn reprovision<S: KeyStore + ?Sized>(store: &S, root: &RootKey) -> Result<Self> {
        let keys = Self::write_fresh(store, root).await?;
        warn!(
            verifying_key = ?keys.public.verifying_key,
            "re-provisioned authority keys, prior secret keys are invalid"
        );
        Ok(keys)
    }

    async fn write_fresh<S: KeyStore + ?Sized>(store: &S, root: &RootKey) -> Result<Self> {
        let (params, master) = setup();
        let signing = SigningKeypair::generate();

        let exported = master.export();
        let seed = signing.seed();
        store
            .put(KeySlot::MasterSecret, &root.seal(KeySlot::MasterSecret, &exported)?)
            .await?;
        store
            .put(KeySlot::SigningKey, &root.seal(KeySlot::SigningKey, seed.as_slice())?)
            .await?;
        store
            .put(KeySlot::VerifyingKey, signing.public_key().as_bytes())
            .await?;
        store
            .put(KeySlot::PublicParameters, &params.to_bytes()?)
            .await?;

        Ok(Self {
            public: PublicMaterial::new(params, signing.public_key()),
            master,
            signing,
        })
    }

    /// Load and unseal everything.
    pub async fn load<S: KeyStore + ?Sized>(store: &S, root: &RootKey) -> Result<Self> {
        let public = PublicMaterial::load(store).await?;

        let sealed = read_slot(store, KeySlot::MasterSecret).await?;
        let master = MasterSecret::import(&root.unseal(KeySlot::MasterSecret, &sealed)?)
            .map_err(|e| KeyError::InvalidKey(format!("master secret: {e}")))?;
        if !master.matches(public.params()) {
            return Err(KeyError::InvalidKey(
                "master secret does not match stored public parameters".into(),
            ));
        }

        let sealed = read_slot(store, KeySlot::SigningKey).await?;
        let signing = SigningKeypair::from_seed_slice(&root.unseal(KeySlot::SigningKey, &sealed)?)?;
        if signing.public_key() != public.verifying_key {
            return Err(KeyError::InvalidKey(
                "signing key does not match stored verifying key".into(),
            ));
        }

        info!(verifying_key = ?public.verifying_key, "loaded authority keys");
        Ok(Self {
            public,
            master,
            signing,
        })
    }

    pub fn public(&self) -> &PublicMaterial {
        &self.public
    }
}

impl std::fmt::Debug for AuthorityKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorityKeys")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

async fn read_slot<S: KeyStore + ?Sized>(store: &S, slot: KeySlot) -> Result<Vec<u8>> {
    store.get(slot).await?.ok_or(KeyError::NotProvisioned(slot))
}

/// An authenticated session: identity, attributes and the credentials
/// issued for them.
#[derive(Debug, Clone)]
pub struct Session {
    pub subject: String,
    pub attributes: AttributeSet,
    pub token: SessionToken,
    pub secret_key: SecretKey,
    /// Token expiry, Unix seconds.
    pub expires_at: i64,
}

/// Issues secret keys and session tokens.
///
/// Owns the master secret and signing key. Retains nothing it issues.
#[derive(Debug)]
pub struct TrustedAuthority {
    keys: AuthorityKeys,
    token_ttl: i64,
}

impl TrustedAuthority {
    pub fn new(keys: AuthorityKeys) -> Self {
        Self {
            keys,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Override the token lifetime in seconds.
    pub fn with_token_ttl(mut self, ttl: i64) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn token_ttl(&self) -> i64 {
        self.token_ttl
    }

    pub fn public(&self) -> &PublicMaterial {
        self.keys.public()
    }

    /// Derive a secret key for `attrs`.
    pub fn issue_secret_key(&self, attrs: &AttributeSet) -> Result<SecretKey> {
        Ok(keygen(self.keys.public.params(), &self.keys.master, attrs)?)
    }

    /// Sign a token for `subject` valid from now for the configured TTL.
    pub fn issue_token(&self, subject: &str, attrs: &AttributeSet) -> Result<SessionToken> {
        self.issue_token_at(subject, attrs, now_secs())
    }

    /// Sign a token issued at `now` (Unix seconds).
    pub fn issue_token_at(
        &self,
        subject: &str,
        attrs: &AttributeSet,
        now: i64,
    ) -> Result<SessionToken> {
        let claims = Claims {
            sub: subject.to_string(),
            attrs: attrs.clone(),
            iat: now,
            exp: now + self.token_ttl,
        };
        SessionToken::sign(&claims, &self.keys.signing)
    }

    /// Turn a verified `(subject, raw attributes)` pair from the credential
    /// service into a session.
    pub fn login<I, S>(&self, subject: &str, raw_attrs: I) -> Result<Session>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.login_at(subject, raw_attrs, now_secs())
    }

    pub fn login_at<I, S>(&self, subject: &str, raw_attrs: I, now: i64) -> Result<Session>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let attributes = AttributeSet::for_subject(subject, raw_attrs)?;
        let secret_key = self.issue_secret_key(&attributes)?;
        let token = self.issue_token_at(subject, &attributes, now)?;
        info!(attributes = attributes.len(), "session issued");
        Ok(Session {
            subject: subject.to_string(),
            attributes,
            token,
            secret_key,
            expires_at: now + self.token_ttl,
        })
    }
}
