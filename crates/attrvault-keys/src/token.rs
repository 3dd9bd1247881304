//! Signed session tokens.
//!
//! Compact three-part form, verifiable offline with only the authority's
//! public key:
//!
//! ```text
//! base64url(header) . base64url(claims) . base64url(signature)
//! ```
//!
//! The header is always `{"alg":"EdDSA","typ":"JWT"}`. The signature is
//! Ed25519 over the ASCII bytes of `header.claims`.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

use attrvault_core::AttributeSet;

use crate::error::{KeyError, Result};
use crate::signing::{AuthorityPublicKey, SigningKeypair};

/// Lifetime of a session token in seconds.
pub const DEFAULT_TOKEN_TTL: i64 = 3600;

const ALG: &str = "EdDSA";
const TYP: &str = "JWT";

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// The signed claim set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated subject.
    pub sub: String,
    /// Normalized attributes of the session.
    pub attrs: AttributeSet,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Whether the claims are still valid at `now`. Valid up to and
    /// including `exp`.
    pub fn is_valid(&self, now: i64) -> bool {
        now <= self.exp
    }
}

/// A token in compact wire form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Sign `claims` into a token.
    pub fn sign(claims: &Claims, keypair: &SigningKeypair) -> Result<Self> {
        let header = Header {
            alg: ALG.into(),
            typ: TYP.into(),
        };
        let header = URL_SAFE_NO_PAD.encode(to_json(&header)?);
        let body = URL_SAFE_NO_PAD.encode(to_json(claims)?);
        let signing_input = format!("{header}.{body}");
        let signature = URL_SAFE_NO_PAD.encode(keypair.sign(signing_input.as_bytes()));
        Ok(Self(format!("{signing_input}.{signature}")))
    }

    /// Wrap a token received over the wire. Not verified.
    pub fn from_compact(compact: impl Into<String>) -> Self {
        Self(compact.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({} bytes)", self.0.len())
    }
}

/// Verifies tokens with the authority's public key only.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    public_key: AuthorityPublicKey,
}

impl TokenVerifier {
    pub fn new(public_key: AuthorityPublicKey) -> Self {
        Self { public_key }
    }

    pub fn public_key(&self) -> &AuthorityPublicKey {
        &self.public_key
    }

    /// Verify against the system clock.
    pub fn verify(&self, token: &str) -> Result<(String, AttributeSet)> {
        self.verify_at(token, now_secs())
    }

    /// Verify at an explicit time (Unix seconds).
    ///
    /// The signature is checked before anything inside the token is parsed.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<(String, AttributeSet)> {
        let claims = self.verify_claims_at(token, now)?;
        Ok((claims.sub, claims.attrs))
    }

    /// Like [`Self::verify_at`] but returns the full claim set.
    pub fn verify_claims_at(&self, token: &str, now: i64) -> Result<Claims> {
        let mut parts = token.split('.');
        let (Some(header), Some(body), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three segments"));
        };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| malformed("signature is not base64url"))?;
        let signing_input = &token[..header.len() + 1 + body.len()];
        if let Err(e) = self.public_key.verify(signing_input.as_bytes(), &signature) {
            debug!("token signature rejected");
            return Err(e);
        }

        let header: Header = from_segment(header)?;
        if header.alg != ALG {
            return Err(malformed("unsupported algorithm"));
        }
        let claims: Claims = from_segment(body)?;

        if !claims.is_valid(now) {
            debug!(exp = claims.exp, now, "token expired");
            return Err(KeyError::Expired);
        }
        Ok(claims)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| KeyError::Serialization(e.to_string()))
}

fn from_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| malformed("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(&e.to_string()))
}

fn malformed(reason: &str) -> KeyError {
    KeyError::MalformedToken(reason.to_string())
}

/// Current Unix time in seconds.
pub(crate) fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: i64 = 1_700_000_000;

    fn claims(iat: i64) -> Claims {
        Claims {
            sub: "42".into(),
            attrs: AttributeSet::for_subject("42", ["patient", "doctor"]).unwrap(),
            iat,
            exp: iat + DEFAULT_TOKEN_TTL,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = SigningKeypair::generate();
        let token = SessionToken::sign(&claims(T), &keypair).unwrap();
        let verifier = TokenVerifier::new(keypair.public_key());

        let (sub, attrs) = verifier.verify_at(token.as_str(), T).unwrap();
        assert_eq!(sub, "42");
        assert_eq!(attrs, claims(T).attrs);
    }

    #[test]
    fn test_expiry_boundary() {
        let keypair = SigningKeypair::generate();
        let token = SessionToken::sign(&claims(T), &keypair).unwrap();
        let verifier = TokenVerifier::new(keypair.public_key());

        assert!(verifier.verify_at(token.as_str(), T + 3599).is_ok());
        assert!(verifier.verify_at(token.as_str(), T + 3600).is_ok());
        assert!(matches!(
            verifier.verify_at(token.as_str(), T + 3601),
            Err(KeyError::Expired)
        ));
    }

    #[test]
    fn test_wire_format() {
        let keypair = SigningKeypair::generate();
        let token = SessionToken::sign(&claims(T), &keypair).unwrap();

        let parts: Vec<&str> = token.as_str().split('.').collect();
        assert_eq!(parts.len(), 3);
        let header = URL_SAFE_NO_PAD.decode(parts[0]).unwrap();
        assert_eq!(header, br#"{"alg":"EdDSA","typ":"JWT"}"#);

        let body: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(body["sub"], "42");
        assert_eq!(body["exp"], T + 3600);
        assert_eq!(body["attrs"], serde_json::json!(["DOCTOR", "PATIENT42"]));
    }

    #[test]
    fn test_other_authority_is_rejected() {
        let token = SessionToken::sign(&claims(T), &SigningKeypair::generate()).unwrap();
        let verifier = TokenVerifier::new(SigningKeypair::generate().public_key());
        assert!(matches!(
            verifier.verify_at(token.as_str(), T),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_tampered_claims_are_rejected() {
        let keypair = SigningKeypair::generate();
        let token = SessionToken::sign(&claims(T), &keypair).unwrap();
        let verifier = TokenVerifier::new(keypair.public_key());

        let mut forged = claims(T);
        forged.attrs = AttributeSet::from_raw(["admin"]).unwrap();
        let forged_body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let parts: Vec<&str> = token.as_str().split('.').collect();
        let forged_token = format!("{}.{}.{}", parts[0], forged_body, parts[2]);

        assert!(matches!(
            verifier.verify_at(&forged_token, T),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_forgery_reports_signature_first() {
        let token = SessionToken::sign(&claims(T), &SigningKeypair::generate()).unwrap();
        let verifier = TokenVerifier::new(SigningKeypair::generate().public_key());
        assert!(matches!(
            verifier.verify_at(token.as_str(), T + 10_000),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = TokenVerifier::new(SigningKeypair::generate().public_key());
        for token in ["", "a.b", "a.b.c.d", "a.b.!!!"] {
            assert!(
                matches!(
                    verifier.verify_at(token, T),
                    Err(KeyError::MalformedToken(_))
                ),
                "{token:?}"
            );
        }
    }

    #[test]
    fn test_debug_does_not_print_token() {
        let keypair = SigningKeypair::generate();
        let token = SessionToken::sign(&claims(T), &keypair).unwrap();
        assert!(!format!("{token:?}").contains(token.as_str()));
    }

    proptest! {
        #[test]
        fn test_arbitrary_strings_never_verify(token in "[A-Za-z0-9_.-]{0,200}") {
            let verifier = TokenVerifier::new(SigningKeypair::from_seed(&[1u8; 32]).public_key());
            prop_assert!(verifier.verify_at(&token, T).is_err());
        }
    }
}
