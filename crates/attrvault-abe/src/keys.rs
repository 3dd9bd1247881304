//! Key material for the CP-ABE scheme.
//!
//! [`PublicParameters`] are freely distributable. [`MasterSecret`] never
//! leaves the trusted authority except as bytes produced by
//! [`MasterSecret::export`], which the caller seals. [`SecretKey`]s belong to the user session they
//! were issued for.

use std::collections::BTreeMap;
use std::fmt;

use rabe_bn::{pairing, Fr, Gt, G1, G2};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use attrvault_core::{Attribute, AttributeSet};

use crate::error::{AbeError, Result};
use crate::group::{fr_from_bytes, to_cbor};

/// Identifies one setup. Keys and ciphertexts from different setups never mix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamsId(pub [u8; 32]);

impl fmt::Debug for ParamsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamsId({})", hex_prefix(&self.0))
    }
}

fn hex_prefix(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Scheme-wide public key material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicParameters {
    pub(crate) g1: G1,
    pub(crate) g2: G2,
    /// `g2^beta`
    pub(crate) h: G2,
    /// `e(g1, g2)^alpha`
    pub(crate) e_gg_alpha: Gt,
}

impl PublicParameters {
    /// Stable identifier for this setup.
    pub fn id(&self) -> Result<ParamsId> {
        let bytes = to_cbor(&self.e_gg_alpha)?;
        Ok(ParamsId(blake3::derive_key("attrvault abe v1 params-id", &bytes)))
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| AbeError::Serialization(e.to_string()))
    }
}

/// Scheme-wide master secret.
///
/// Held as the two random seeds `alpha` and `beta` are reduced from, in
/// buffers that are wiped on drop. Not `Serialize` and not `Clone`: the only
/// ways out are [`Self::export`] for sealing at rest and key generation.
pub struct MasterSecret {
    alpha: Zeroizing<[u8; SEED_LEN]>,
    beta: Zeroizing<[u8; SEED_LEN]>,
}

const SEED_LEN: usize = 64;

impl MasterSecret {
    pub(crate) fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut alpha = Zeroizing::new([0u8; SEED_LEN]);
        let mut beta = Zeroizing::new([0u8; SEED_LEN]);
        rng.fill_bytes(&mut alpha[..]);
        rng.fill_bytes(&mut beta[..]);
        Self { alpha, beta }
    }

    pub(crate) fn alpha(&self) -> Fr {
        fr_from_bytes(&self.alpha[..])
    }

    pub(crate) fn beta(&self) -> Fr {
        fr_from_bytes(&self.beta[..])
    }

    /// Whether `pp` was produced by the same setup as this secret.
    pub fn matches(&self, pp: &PublicParameters) -> bool {
        pp.g2 * self.beta() == pp.h && pairing(pp.g1 * self.alpha(), pp.g2) == pp.e_gg_alpha
    }

    /// Serialize for sealing at rest. The buffer is wiped on drop.
    pub fn export(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(2 * SEED_LEN));
        out.extend_from_slice(&self.alpha[..]);
        out.extend_from_slice(&self.beta[..]);
        out
    }

    /// Restore from bytes produced by [`Self::export`].
    pub fn import(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 2 * SEED_LEN {
            return Err(AbeError::Serialization(format!(
                "master secret must be {} bytes, got {}",
                2 * SEED_LEN,
                bytes.len()
            )));
        }
        let mut alpha = Zeroizing::new([0u8; SEED_LEN]);
        let mut beta = Zeroizing::new([0u8; SEED_LEN]);
        alpha.copy_from_slice(&bytes[..SEED_LEN]);
        beta.copy_from_slice(&bytes[SEED_LEN..]);
        Ok(Self { alpha, beta })
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// Per-attribute key component: `(g1^r * H(attr)^r_j, g2^r_j)`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct KeyComponent {
    pub(crate) d: G1,
    pub(crate) d_prime: G2,
}

/// A user's decryption key, bound to the attribute set it was issued for.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretKey {
    pub(crate) params: ParamsId,
    /// `g1^((alpha + r) / beta)`
    pub(crate) d: G1,
    pub(crate) components: BTreeMap<Attribute, KeyComponent>,
}

impl SecretKey {
    /// The attributes this key was issued for.
    pub fn attributes(&self) -> AttributeSet {
        self.components.keys().cloned().collect()
    }

    pub fn has(&self, attr: &Attribute) -> bool {
        self.components.contains_key(attr)
    }

    /// The setup this key belongs to.
    pub fn params_id(&self) -> ParamsId {
        self.params
    }

    /// Serialize to CBOR bytes for delivery to the client.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| AbeError::Serialization(e.to_string()))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("params", &self.params)
            .field("attributes", &self.components.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
