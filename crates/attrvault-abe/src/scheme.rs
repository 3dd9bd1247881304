//! Setup, key generation, encryption and decryption.
//!
//! The target-group element `M` hidden under the policy is random; the
//! content key travels AEAD-sealed under a key derived from `M`, with the
//! policy text as associated data.

use std::collections::BTreeMap;

use rabe_bn::{pairing, Fr, Group, Gt, G1, G2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use attrvault_core::{AccessPolicy, AttributeSet, ContentKey, EncryptionNonce};

use crate::error::{AbeError, Result};
use crate::group::{gt_wrap_key, hash_to_g1, to_cbor};
use crate::keys::{KeyComponent, MasterSecret, ParamsId, PublicParameters, SecretKey};
use crate::sharing::{plan, share};

/// Ciphertext components for one policy leaf.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct LeafCipher {
    /// `g2^q_y`
    pub(crate) c_y: G2,
    /// `H(attr)^q_y`
    pub(crate) c_y_prime: G1,
}

/// A content key sealed under an access policy.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedKey {
    pub(crate) params: ParamsId,
    pub(crate) policy: AccessPolicy,
    /// `M * e(g1, g2)^(alpha * s)`
    pub(crate) c_tilde: Gt,
    /// `h^s`
    pub(crate) c: G2,
    pub(crate) leaves: Vec<LeafCipher>,
    pub(crate) nonce: [u8; 12],
    pub(crate) sealed_key: Vec<u8>,
}

impl WrappedKey {
    /// The policy this key was sealed under. Public by construction.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// The setup this key was sealed for.
    pub fn params_id(&self) -> ParamsId {
        self.params
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| AbeError::Serialization(e.to_string()))
    }
}

impl std::fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKey")
            .field("params", &self.params)
            .field("policy", &self.policy.to_string())
            .field("leaves", &self.leaves.len())
            .finish_non_exhaustive()
    }
}

/// Generate a fresh pair of public parameters and master secret.
pub fn setup() -> (PublicParameters, MasterSecret) {
    let mut rng = rand::thread_rng();
    let g1 = G1::random(&mut rng);
    let g2 = G2::random(&mut rng);
    let msk = MasterSecret::generate(&mut rng);

    let pp = PublicParameters {
        g1,
        g2,
        h: g2 * msk.beta(),
        e_gg_alpha: pairing(g1 * msk.alpha(), g2),
    };
    (pp, msk)
}

/// Derive a secret key for exactly `attributes`.
pub fn keygen(
    pp: &PublicParameters,
    msk: &MasterSecret,
    attributes: &AttributeSet,
) -> Result<SecretKey> {
    if attributes.is_empty() {
        return Err(AbeError::KeyGen("attribute set is empty".into()));
    }
    let beta_inv = msk
        .beta()
        .inverse()
        .ok_or_else(|| AbeError::KeyGen("degenerate master secret".into()))?;

    let mut rng = rand::thread_rng();
    let r = rng.gen::<Fr>();
    let g1_r = pp.g1 * r;

    let components: BTreeMap<_, _> = attributes
        .iter()
        .map(|attr| {
            let r_j = rng.gen::<Fr>();
            let component = KeyComponent {
                d: g1_r + hash_to_g1(attr)? * r_j,
                d_prime: pp.g2 * r_j,
            };
            Ok((attr.clone(), component))
        })
        .collect::<Result<_>>()?;

    debug!(attributes = attributes.len(), "issued secret key");
    Ok(SecretKey {
        params: pp.id()?,
        d: (pp.g1 * msk.alpha() + g1_r) * beta_inv,
        components,
    })
}

/// Seal `content_key` so that only holders of a satisfying attribute set
/// can recover it. Randomized: equal inputs give unrelated outputs.
pub fn encrypt(
    pp: &PublicParameters,
    content_key: &ContentKey,
    policy: &AccessPolicy,
) -> Result<WrappedKey> {
    policy.validate()?;

    let mut rng = rand::thread_rng();
    let s = rng.gen::<Fr>();
    let shares = share(policy, s, &mut rng);

    let leaves: Vec<LeafCipher> = policy
        .literals()
        .into_iter()
        .zip(shares)
        .map(|(attr, q)| {
            Ok(LeafCipher {
                c_y: pp.g2 * q,
                c_y_prime: hash_to_g1(attr)? * q,
            })
        })
        .collect::<Result<_>>()?;

    let m = pairing(G1::random(&mut rng), G2::random(&mut rng));
    let wrap_key = gt_wrap_key(&m)?;
    let nonce = EncryptionNonce::generate();
    let policy_text = policy.to_string();
    let sealed_key = wrap_key
        .encrypt(content_key.as_bytes(), &nonce, policy_text.as_bytes())
        .map_err(|_| AbeError::EncryptionFailed)?;

    debug!(leaves = policy.leaf_count(), "sealed content key");
    Ok(WrappedKey {
        params: pp.id()?,
        policy: policy.clone(),
        c_tilde: pp.e_gg_alpha.pow(s) * m,
        c: pp.h * s,
        leaves,
        nonce: *nonce.as_bytes(),
        sealed_key,
    })
}

/// Recover the content key, or fail with [`AbeError::PermissionDenied`].
///
/// Every failure past this point, whether an unsatisfied policy, a
/// structurally broken ciphertext or a key from another setup, collapses
/// into the same error.
pub fn decrypt(pp: &PublicParameters, sk: &SecretKey, wrapped: &WrappedKey) -> Result<ContentKey> {
    let params = pp.id()?;
    if sk.params != params || wrapped.params != params {
        return Err(AbeError::PermissionDenied);
    }
    wrapped
        .policy
        .validate()
        .map_err(|_| AbeError::PermissionDenied)?;
    if wrapped.leaves.len() != wrapped.policy.leaf_count() {
        return Err(AbeError::PermissionDenied);
    }

    let literals = wrapped.policy.literals();
    let plan = plan(&wrapped.policy, |attr| sk.has(attr)).ok_or(AbeError::PermissionDenied)?;

    let mut a = Gt::one();
    for (index, coef) in plan {
        let attr = literals[index];
        let leaf = &wrapped.leaves[index];
        let component = sk.components.get(attr).ok_or(AbeError::PermissionDenied)?;
        let term = pairing(component.d, leaf.c_y) * pairing(-leaf.c_y_prime, component.d_prime);
        a = a * term.pow(coef);
    }

    let m = wrapped.c_tilde * a * pairing(-sk.d, wrapped.c);
    let wrap_key = gt_wrap_key(&m).map_err(|_| AbeError::PermissionDenied)?;
    let nonce = EncryptionNonce::from_bytes(wrapped.nonce);
    let policy_text = wrapped.policy.to_string();
    let bytes = wrap_key
        .decrypt(&wrapped.sealed_key, &nonce, policy_text.as_bytes())
        .map_err(|_| AbeError::PermissionDenied)?;

    ContentKey::from_slice(&bytes).map_err(|_| AbeError::PermissionDenied)
}
