//! Attribute normalization.
//!
//! Every component that compares attributes goes through [`normalize`], so
//! `doctor`, `Doctor` and `DOC-TOR` are all the same capability. Owner
//! binding (`patient` + `42` becomes `PATIENT42`) lives here too.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The normalized role name that is bound to a record owner.
pub const PATIENT_ROLE: &str = "PATIENT";

/// Normalized forms that collide with policy keywords.
const RESERVED: [&str; 3] = ["AND", "OR", "OF"];

/// Canonicalize a raw attribute string.
///
/// Upper-cases every character and drops everything that is not
/// alphanumeric (underscores, dashes, spaces, `+`, ...).
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalized capability token.
///
/// The inner string is always non-empty and already in canonical form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Attribute(String);

impl Attribute {
    /// Normalize `raw` into an attribute.
    ///
    /// Fails when nothing is left after normalization or when the result is
    /// a policy keyword, which could not be written back as policy text.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() || RESERVED.contains(&normalized.as_str()) {
            return Err(CoreError::InvalidAttribute(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Bind a role to a specific record owner (`patient`, `42` -> `PATIENT42`).
    pub fn owned(role: &str, owner: &str) -> Result<Self> {
        Self::new(&format!("{role}_{owner}"))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this attribute carries `role` (already normalized) as a substring.
    pub fn grants(&self, role: &str) -> bool {
        !role.is_empty() && self.0.contains(role)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute({})", self.0)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Attribute {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Attribute {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Attribute> for String {
    fn from(attr: Attribute) -> Self {
        attr.0
    }
}

/// The attributes held by one authenticated user for one session.
///
/// Ordered and deduplicated so that serialization and iteration are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeSet<Attribute>);

impl AttributeSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw attribute list as delivered by the credential service.
    pub fn from_raw<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|r| Attribute::new(r.as_ref()))
            .collect::<Result<BTreeSet<_>>>()
            .map(Self)
    }

    /// Normalize a raw attribute list for a logged-in subject.
    ///
    /// A bare patient role is bound to the subject, so the resulting key can
    /// only satisfy that patient's own owner-bound policy literal.
    pub fn for_subject<I, S>(subject: &str, raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for r in raw {
            let attr = Attribute::new(r.as_ref())?;
            if attr.as_str() == PATIENT_ROLE {
                set.insert(Attribute::owned(PATIENT_ROLE, subject)?);
            } else {
                set.insert(attr);
            }
        }
        Ok(Self(set))
    }

    /// Add an attribute. Returns false if it was already present.
    pub fn insert(&mut self, attr: Attribute) -> bool {
        self.0.insert(attr)
    }

    pub fn contains(&self, attr: &Attribute) -> bool {
        self.0.contains(attr)
    }

    /// Attributes that carry the (normalized) role as a substring.
    pub fn granting<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.0.iter().filter(move |a| a.grants(role))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AttributeSet {
    type Item = Attribute;
    type IntoIter = std::collections::btree_set::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::collections::btree_set::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize("patient_42"), "PATIENT42");
        assert_eq!(normalize("Pharma-cist"), "PHARMACIST");
        assert_eq!(normalize(" doctor + 7 "), "DOCTOR7");
    }

    #[test]
    fn test_empty_attribute_rejected() {
        assert!(Attribute::new("").is_err());
        assert!(Attribute::new("__--").is_err());
    }

    #[test]
    fn test_keyword_attributes_rejected() {
        for raw in ["and", "OR", "o_f", "A-N-D"] {
            assert!(
                matches!(Attribute::new(raw), Err(CoreError::InvalidAttribute(_))),
                "{raw}"
            );
        }
        assert_eq!(Attribute::new("order").unwrap().as_str(), "ORDER");
        assert_eq!(Attribute::new("2").unwrap().as_str(), "2");
    }

    #[test]
    fn test_owned_attribute() {
        let attr = Attribute::owned("patient", "42").unwrap();
        assert_eq!(attr.as_str(), "PATIENT42");
    }

    #[test]
    fn test_from_raw_deduplicates() {
        let set = AttributeSet::from_raw(["doctor", "DOCTOR", "Doc_tor"]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_for_subject_binds_patient() {
        let set = AttributeSet::for_subject("7", ["patient", "researcher"]).unwrap();
        let names: Vec<_> = set.iter().map(|a| a.as_str()).collect();
        assert_eq!(names, vec!["PATIENT7", "RESEARCHER"]);
    }

    #[test]
    fn test_granting_uses_substring() {
        let set = AttributeSet::from_raw(["patient_42", "doctor"]).unwrap();
        let hits: Vec<_> = set.granting("PATIENT").map(|a| a.as_str()).collect();
        assert_eq!(hits, vec!["PATIENT42"]);
        assert_eq!(set.granting("").count(), 0);
    }

    #[test]
    fn test_serde_rejects_empty() {
        let mut buf = Vec::new();
        ciborium::into_writer(&"--", &mut buf).unwrap();
        let parsed: std::result::Result<Attribute, _> = ciborium::from_reader(buf.as_slice());
        assert!(parsed.is_err());
    }

    proptest! {
        #[test]
        fn test_normalize_idempotent(raw in "[a-zA-Z0-9_ +-]{0,24}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn test_case_and_separator_insensitive(raw in "[a-z0-9]{1,12}") {
            let upper = Attribute::new(&raw.to_uppercase()).unwrap();
            let spaced = Attribute::new(&format!("_{raw}-")).unwrap();
            prop_assert_eq!(upper, spaced);
        }
    }
}
