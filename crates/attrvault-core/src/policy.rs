//! Access policies and the role-template policy engine.
//!
//! A policy is a monotone formula over [`Attribute`] literals. The engine in
//! [`build_policy`] only ever emits a flat OR of literals, but the tree form
//! also covers AND and k-of-n gates so hand-written policies can be parsed
//! and enforced by the same scheme.
//!
//! Textual form:
//!
//! ```text
//! DOCTOR or (NURSE and WARD7) or 2 of (RESEARCHER, ETHICS, DOCTOR)
//! ```
//!
//! `and` binds tighter than `or`; keywords are case-insensitive; literals are
//! normalized on parse.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attribute::{normalize, Attribute, AttributeSet, PATIENT_ROLE};
use crate::error::{CoreError, Result};

/// A boolean access formula over attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    Leaf(Attribute),
    And(Vec<AccessPolicy>),
    Or(Vec<AccessPolicy>),
    /// At least `k` of the children must hold.
    Threshold(usize, Vec<AccessPolicy>),
}

impl AccessPolicy {
    /// A single-literal policy.
    pub fn leaf(attr: Attribute) -> Self {
        AccessPolicy::Leaf(attr)
    }

    /// OR together a set of literals. One literal collapses to a leaf.
    pub fn any_of<I: IntoIterator<Item = Attribute>>(literals: I) -> Result<Self> {
        let mut children: Vec<_> = literals.into_iter().map(AccessPolicy::Leaf).collect();
        match children.len() {
            0 => Err(CoreError::EmptyPolicy),
            1 => Ok(children.remove(0)),
            _ => Ok(AccessPolicy::Or(children)),
        }
    }

    /// AND together a set of literals. One literal collapses to a leaf.
    pub fn all_of<I: IntoIterator<Item = Attribute>>(literals: I) -> Result<Self> {
        let mut children: Vec<_> = literals.into_iter().map(AccessPolicy::Leaf).collect();
        match children.len() {
            0 => Err(CoreError::EmptyPolicy),
            1 => Ok(children.remove(0)),
            _ => Ok(AccessPolicy::And(children)),
        }
    }

    /// The gate view of an inner node: `(k, children)`. `None` for leaves.
    ///
    /// AND is n-of-n, OR is 1-of-n.
    pub fn gate(&self) -> Option<(usize, &[AccessPolicy])> {
        match self {
            AccessPolicy::Leaf(_) => None,
            AccessPolicy::And(children) => Some((children.len(), children)),
            AccessPolicy::Or(children) => Some((1, children)),
            AccessPolicy::Threshold(k, children) => Some((*k, children)),
        }
    }

    /// Check structural soundness: no empty gates, `1 <= k <= n`.
    pub fn validate(&self) -> Result<()> {
        let Some((k, children)) = self.gate() else {
            return Ok(());
        };
        if children.is_empty() {
            return Err(CoreError::EmptyPolicy);
        }
        if k == 0 || k > children.len() {
            return Err(CoreError::InvalidPolicy(format!(
                "threshold {k} out of range for {} children",
                children.len()
            )));
        }
        children.iter().try_for_each(AccessPolicy::validate)
    }

    /// Evaluate the formula against a set of attributes.
    pub fn is_satisfied_by(&self, attrs: &AttributeSet) -> bool {
        match self {
            AccessPolicy::Leaf(attr) => attrs.contains(attr),
            _ => match self.gate() {
                Some((k, children)) => {
                    children.iter().filter(|c| c.is_satisfied_by(attrs)).count() >= k
                }
                None => false,
            },
        }
    }

    /// Leaf attributes in depth-first order (duplicates kept).
    pub fn literals(&self) -> Vec<&Attribute> {
        let mut out = Vec::new();
        self.collect_literals(&mut out);
        out
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a Attribute>) {
        match self {
            AccessPolicy::Leaf(attr) => out.push(attr),
            AccessPolicy::And(children)
            | AccessPolicy::Or(children)
            | AccessPolicy::Threshold(_, children) => {
                for child in children {
                    child.collect_literals(out);
                }
            }
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            AccessPolicy::Leaf(_) => 1,
            AccessPolicy::And(children)
            | AccessPolicy::Or(children)
            | AccessPolicy::Threshold(_, children) => {
                children.iter().map(AccessPolicy::leaf_count).sum()
            }
        }
    }

    /// Parse the textual form.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let policy = parser.expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(CoreError::InvalidPolicy(format!(
                "unexpected trailing input at token {}",
                parser.pos
            )));
        }
        policy.validate()?;
        Ok(policy)
    }
}

/// Build the access policy for a record from its required roles.
///
/// For each role, every user attribute that carries the role is accepted;
/// a role with no matching user attribute is accepted under its generic
/// name. The patient role additionally accepts the owner-bound literal
/// (`PATIENT<owner>`). The literals are deduplicated and OR-ed together.
pub fn build_policy<R: AsRef<str>>(
    required_roles: &[R],
    user_attributes: &AttributeSet,
    owner_identity: &str,
) -> Result<AccessPolicy> {
    let mut literals = BTreeSet::new();

    for role in required_roles {
        let role = normalize(role.as_ref());
        if role.is_empty() {
            continue;
        }

        let mut matched = false;
        for attr in user_attributes.granting(&role) {
            literals.insert(attr.clone());
            matched = true;
        }

        if role == PATIENT_ROLE {
            literals.insert(Attribute::owned(&role, owner_identity)?);
        }

        if !matched {
            literals.insert(Attribute::new(&role)?);
        }
    }

    AccessPolicy::any_of(literals)
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn child(f: &mut fmt::Formatter<'_>, node: &AccessPolicy) -> fmt::Result {
            match node {
                AccessPolicy::Leaf(_) | AccessPolicy::Threshold(..) => write!(f, "{node}"),
                _ => write!(f, "({node})"),
            }
        }

        fn joined(f: &mut fmt::Formatter<'_>, children: &[AccessPolicy], sep: &str) -> fmt::Result {
            for (i, node) in children.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                child(f, node)?;
            }
            Ok(())
        }

        match self {
            AccessPolicy::Leaf(attr) => write!(f, "{attr}"),
            AccessPolicy::And(children) => joined(f, children, " and "),
            AccessPolicy::Or(children) => joined(f, children, " or "),
            AccessPolicy::Threshold(k, children) => {
                write!(f, "{k} of (")?;
                for (i, node) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{node}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for AccessPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Open,
    Close,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    };

    for c in input.chars() {
        match c {
            '(' | ')' | ',' => {
                flush(&mut word, &mut tokens);
                tokens.push(match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    _ => Token::Comma,
                });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);

    if tokens.is_empty() {
        return Err(CoreError::EmptyPolicy);
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_keyword(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.tokens.get(self.pos + offset), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        match self.peek() {
            Some(t) if *t == token => {
                self.pos += 1;
                Ok(())
            }
            other => Err(CoreError::InvalidPolicy(format!(
                "expected {token:?}, found {other:?}"
            ))),
        }
    }

    fn expr(&mut self) -> Result<AccessPolicy> {
        let mut children = vec![self.term()?];
        while self.peek_keyword(0, "or") {
            self.pos += 1;
            children.push(self.term()?);
        }
        Ok(collapse(children, AccessPolicy::Or))
    }

    fn term(&mut self) -> Result<AccessPolicy> {
        let mut children = vec![self.factor()?];
        while self.peek_keyword(0, "and") {
            self.pos += 1;
            children.push(self.factor()?);
        }
        Ok(collapse(children, AccessPolicy::And))
    }

    fn factor(&mut self) -> Result<AccessPolicy> {
        match self.peek().cloned() {
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(Token::Close)?;
                Ok(inner)
            }
            Some(Token::Word(word)) if self.peek_keyword(1, "of") => {
                let k: usize = word
                    .parse()
                    .map_err(|_| CoreError::InvalidPolicy(format!("bad threshold {word:?}")))?;
                self.pos += 2;
                self.expect(Token::Open)?;
                let mut children = vec![self.expr()?];
                while self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                    children.push(self.expr()?);
                }
                self.expect(Token::Close)?;
                Ok(AccessPolicy::Threshold(k, children))
            }
            Some(Token::Word(word)) => {
                if word.eq_ignore_ascii_case("and") || word.eq_ignore_ascii_case("or") {
                    return Err(CoreError::InvalidPolicy(format!("unexpected keyword {word:?}")));
                }
                self.pos += 1;
                Ok(AccessPolicy::Leaf(Attribute::new(&word)?))
            }
            other => Err(CoreError::InvalidPolicy(format!(
                "expected literal, found {other:?}"
            ))),
        }
    }
}

fn collapse(mut children: Vec<AccessPolicy>, gate: fn(Vec<AccessPolicy>) -> AccessPolicy) -> AccessPolicy {
    if children.len() == 1 {
        children.remove(0)
    } else {
        gate(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attrs(raw: &[&str]) -> AttributeSet {
        AttributeSet::from_raw(raw).unwrap()
    }

    fn literal_names(policy: &AccessPolicy) -> Vec<String> {
        policy.literals().iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_health_record_for_doctor() {
        let policy = build_policy(&["doctor", "nurse", "patient"], &attrs(&["DOCTOR"]), "42").unwrap();
        assert_eq!(
            literal_names(&policy),
            vec!["DOCTOR", "NURSE", "PATIENT", "PATIENT42"]
        );
    }

    #[test]
    fn test_specific_attribute_satisfies_generic_role() {
        let policy =
            build_policy(&["doctor", "nurse", "patient"], &attrs(&["patient_42"]), "42").unwrap();
        assert_eq!(literal_names(&policy), vec!["DOCTOR", "NURSE", "PATIENT42"]);
    }

    #[test]
    fn test_matching_is_case_and_separator_insensitive() {
        let policy = build_policy(&["Pharma_cist"], &attrs(&["pharmacist-ward3"]), "1").unwrap();
        assert_eq!(policy, AccessPolicy::Leaf(Attribute::new("PHARMACISTWARD3").unwrap()));
    }

    #[test]
    fn test_single_role_without_match() {
        let policy = build_policy(&["financial"], &attrs(&["doctor"]), "9").unwrap();
        assert_eq!(policy.to_string(), "FINANCIAL");
    }

    #[test]
    fn test_empty_roles_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            build_policy(&empty, &attrs(&["doctor"]), "1"),
            Err(CoreError::EmptyPolicy)
        ));
        assert!(matches!(
            build_policy(&["__", ""], &attrs(&["doctor"]), "1"),
            Err(CoreError::EmptyPolicy)
        ));
    }

    #[test]
    fn test_policy_is_deterministic() {
        let a = build_policy(&["patient", "doctor"], &attrs(&["doctor"]), "5").unwrap();
        let b = build_policy(&["doctor", "patient", "doctor"], &attrs(&["DOCTOR"]), "5").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let text = "DOCTOR or (NURSE and WARD7) or 2 of (RESEARCHER, ETHICS, DOCTOR)";
        let policy = AccessPolicy::parse(text).unwrap();
        assert_eq!(policy.to_string(), text);
        assert_eq!(AccessPolicy::parse(&policy.to_string()).unwrap(), policy);
    }

    #[test]
    fn test_numeric_and_keyword_like_literals_roundtrip() {
        let leaf = |raw: &str| AccessPolicy::Leaf(Attribute::new(raw).unwrap());
        let policy = AccessPolicy::Or(vec![
            AccessPolicy::And(vec![leaf("2"), leaf("office")]),
            leaf("orderly"),
            AccessPolicy::Threshold(1, vec![leaf("3"), leaf("andrology")]),
        ]);
        let text = policy.to_string();
        assert_eq!(text, "(2 and OFFICE) or ORDERLY or 1 of (3, ANDROLOGY)");
        assert_eq!(AccessPolicy::parse(&text).unwrap(), policy);

        assert!(Attribute::try_from("or".to_string()).is_err());
    }

    #[test]
    fn test_parse_precedence() {
        let policy = AccessPolicy::parse("a and b or c").unwrap();
        assert_eq!(policy.to_string(), "(A and B) or C");
    }

    #[test]
    fn test_parse_normalizes_and_is_case_insensitive() {
        let policy = AccessPolicy::parse("patient_42 OR Doctor").unwrap();
        assert_eq!(policy.to_string(), "PATIENT42 or DOCTOR");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(AccessPolicy::parse("   "), Err(CoreError::EmptyPolicy)));
        assert!(AccessPolicy::parse("a or").is_err());
        assert!(AccessPolicy::parse("(a or b").is_err());
        assert!(AccessPolicy::parse("a b").is_err());
        assert!(AccessPolicy::parse("3 of (a, b)").is_err());
        assert!(AccessPolicy::parse("0 of (a)").is_err());
        assert!(AccessPolicy::parse("x of (a)").is_err());
    }

    #[test]
    fn test_satisfaction() {
        let policy = AccessPolicy::parse("2 of (a, b, c) and d").unwrap();
        assert!(policy.is_satisfied_by(&attrs(&["a", "c", "d"])));
        assert!(!policy.is_satisfied_by(&attrs(&["a", "d"])));
        assert!(!policy.is_satisfied_by(&attrs(&["a", "b", "c"])));
    }

    #[test]
    fn test_validate_rejects_empty_gate() {
        assert!(AccessPolicy::Or(vec![]).validate().is_err());
        assert!(AccessPolicy::Threshold(2, vec![AccessPolicy::Leaf(Attribute::new("a").unwrap())])
            .validate()
            .is_err());
    }

    proptest! {
        #[test]
        fn test_built_policy_is_or_of_literals(
            roles in prop::collection::vec("[a-z]{1,6}", 1..4),
            user in prop::collection::vec("[a-z0-9][a-z0-9_]{0,7}", 0..4),
            owner in "[0-9]{1,3}",
        ) {
            let user = AttributeSet::from_raw(&user).unwrap();
            let policy = build_policy(&roles, &user, &owner).unwrap();
            let literals = policy.literals();

            // Satisfied exactly when the set holds one of the literals.
            let holds_literal = literals.iter().any(|l| user.contains(l));
            prop_assert_eq!(policy.is_satisfied_by(&user), holds_literal);

            // Literals are unique and normalized.
            let unique: BTreeSet<_> = literals.iter().collect();
            prop_assert_eq!(unique.len(), literals.len());
            for l in &literals {
                prop_assert_eq!(normalize(l.as_str()), l.as_str());
            }
        }
    }
}
