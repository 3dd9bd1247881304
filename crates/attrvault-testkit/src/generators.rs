//! Proptest generators for property-based testing.

use proptest::prelude::*;

use attrvault::RecordKind;
use attrvault_core::{AccessPolicy, Attribute, AttributeSet};

/// Role names used across the generators.
pub const ROLES: [&str; 6] = ["doctor", "nurse", "patient", "pharmacist", "researcher", "financial"];

/// A raw attribute as a credential service might deliver it: mixed case,
/// with separators.
pub fn raw_attribute() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(ROLES.to_vec()).prop_map(String::from),
        "[A-Za-z][A-Za-z0-9_-]{0,11}"
            .prop_filter("policy keyword", |raw| Attribute::new(raw).is_ok()),
    ]
}

/// A subject identifier.
pub fn subject() -> impl Strategy<Value = String> {
    "[0-9]{1,4}"
}

/// A non-empty normalized attribute set drawn from `universe`.
pub fn attribute_subset(universe: Vec<Attribute>) -> impl Strategy<Value = AttributeSet> {
    let len = universe.len();
    prop::sample::subsequence(universe, 1..=len).prop_map(|v| v.into_iter().collect())
}

/// A list of required roles, possibly with duplicates.
pub fn required_roles() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(ROLES.to_vec()).prop_map(String::from), 1..=4)
}

/// A record kind.
pub fn record_kind() -> impl Strategy<Value = RecordKind> {
    prop::sample::select(RecordKind::ALL.to_vec())
}

/// Payload bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A structurally valid policy tree over `universe`, at most `depth` gates
/// deep.
pub fn policy_tree(universe: Vec<Attribute>, depth: u32) -> impl Strategy<Value = AccessPolicy> {
    let leaf = prop::sample::select(universe).prop_map(AccessPolicy::Leaf);
    leaf.prop_recursive(depth, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..=3).prop_map(AccessPolicy::Or),
            prop::collection::vec(inner.clone(), 1..=3).prop_map(AccessPolicy::And),
            prop::collection::vec(inner, 1..=3).prop_flat_map(|children| {
                let n = children.len();
                (1..=n).prop_map(move |k| AccessPolicy::Threshold(k, children.clone()))
            }),
        ]
    })
}

/// The default small universe: `A`, `B`, `C`, `D`.
pub fn small_universe() -> Vec<Attribute> {
    ["a", "b", "c", "d"]
        .into_iter()
        .filter_map(|raw| Attribute::new(raw).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_raw_attributes_normalize(raw in raw_attribute()) {
            prop_assert!(Attribute::new(&raw).is_ok());
        }

        #[test]
        fn test_policy_trees_are_valid(policy in policy_tree(small_universe(), 3)) {
            prop_assert!(policy.validate().is_ok());
            prop_assert_eq!(policy.literals().len(), policy.leaf_count());
        }

        #[test]
        fn test_policy_text_preserves_meaning(
            policy in policy_tree(small_universe(), 2),
            holder in attribute_subset(small_universe()),
        ) {
            let parsed = AccessPolicy::parse(&policy.to_string()).unwrap();
            prop_assert_eq!(parsed.is_satisfied_by(&holder), policy.is_satisfied_by(&holder));
        }

        #[test]
        fn test_subsets_are_non_empty(set in attribute_subset(small_universe())) {
            prop_assert!(!set.is_empty());
        }
    }
}
