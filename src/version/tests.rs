//! Tests for version comparison
//!
//! Unit tests for the documented comparisons and property-based tests for the
//! ordering laws.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Documented comparisons
// ============================================================================

#[test]
fn test_trailing_zero_padding() {
    assert_eq!(compare_versions("1.2.0", "1.2"), VersionOrdering::Same);
    assert_eq!(compare_versions("1.2", "1.2.0.0.0"), VersionOrdering::Same);
}

#[test]
fn test_numeric_not_lexical() {
    assert_eq!(compare_versions("1.10.0", "1.9.9"), VersionOrdering::Newer);
    assert_eq!(compare_versions("1.9.9", "1.10.0"), VersionOrdering::Older);
}

#[test]
fn test_most_significant_component_wins() {
    assert_eq!(compare_versions("2.0", "1.9.9.9"), VersionOrdering::Newer);
    assert_eq!(compare_versions("1.0.0", "1.2.0"), VersionOrdering::Older);
}

#[test]
fn test_empty_string_is_zero() {
    assert_eq!(compare_versions("", "1.0.0"), VersionOrdering::Older);
    assert_eq!(compare_versions("", ""), VersionOrdering::Same);
    assert_eq!(compare_versions("", "0.0"), VersionOrdering::Same);
}

#[test]
fn test_non_numeric_components_are_zero() {
    assert_eq!(compare_versions("abc", "0"), VersionOrdering::Same);
    assert_eq!(compare_versions("1.x.3", "1.0.3"), VersionOrdering::Same);
    assert_eq!(compare_versions("v2", "1"), VersionOrdering::Older);
    assert_eq!(compare_versions("1..2", "1.0.2"), VersionOrdering::Same);
    assert_eq!(compare_versions("1.-2", "1"), VersionOrdering::Same);
}

#[test]
fn test_leading_zeros_ignored() {
    assert_eq!(compare_versions("1.02", "1.2"), VersionOrdering::Same);
    assert_eq!(compare_versions("007", "7"), VersionOrdering::Same);
}

#[test]
fn test_unbounded_magnitude() {
    let huge = "1.99999999999999999999999999999999";
    let huger = "1.100000000000000000000000000000000";
    assert_eq!(compare_versions(huger, huge), VersionOrdering::Newer);
    assert_eq!(compare_versions(huge, huge), VersionOrdering::Same);
}

#[test]
fn test_whitespace_is_trimmed() {
    assert_eq!(compare_versions(" 1.2.3 ", "1.2.3"), VersionOrdering::Same);
}

#[test]
fn test_is_newer() {
    assert!(is_newer("1.2.0", "1.0.0"));
    assert!(!is_newer("1.0.0", "1.0.0"));
    assert!(!is_newer("0.9", "1.0"));
}

#[test]
fn test_version_string_components() {
    let v = VersionString::new("01.2.x.");
    assert_eq!(v.components(), vec!["1", "2", "", ""]);
    assert_eq!(v.as_str(), "01.2.x.");
    assert_eq!(v.to_string(), "01.2.x.");
}

#[test]
fn test_version_string_equality_uses_padding() {
    assert_eq!(VersionString::new("1.2"), VersionString::new("1.2.0"));
    assert!(VersionString::new("1.10") > VersionString::new("1.9"));
}

#[test]
fn test_version_ordering_serde() {
    assert_eq!(serde_json::to_string(&VersionOrdering::Newer).unwrap(), "\"newer\"");
    let v: VersionString = serde_json::from_str("\"1.2.3\"").unwrap();
    assert_eq!(v.as_str(), "1.2.3");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn arb_version() -> impl Strategy<Value = String> {
    prop::collection::vec(0u64..1000, 0..6).prop_map(|parts| {
        parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    })
}

fn arb_messy_version() -> impl Strategy<Value = String> {
    prop::collection::vec("[0-9a-z]{0,4}", 0..6).prop_map(|parts| parts.join("."))
}

proptest! {
    /// Property: a version always compares Same against itself
    #[test]
    fn prop_reflexive(v in arb_messy_version()) {
        prop_assert_eq!(compare_versions(&v, &v), VersionOrdering::Same);
    }

    /// Property: swapping the arguments reverses the result
    #[test]
    fn prop_antisymmetric(a in arb_messy_version(), b in arb_messy_version()) {
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    }

    /// Property: appending zero components never changes the result
    #[test]
    fn prop_zero_padding_is_neutral(v in arb_version(), zeros in 0usize..4) {
        let mut padded = v.clone();
        for _ in 0..zeros {
            padded.push_str(".0");
        }
        prop_assert_eq!(compare_versions(&padded, &v), VersionOrdering::Same);
    }

    /// Property: agrees with integer comparison for small numeric versions
    #[test]
    fn prop_matches_integer_comparison(
        a in prop::collection::vec(0u64..1000, 1..5),
        b in prop::collection::vec(0u64..1000, 1..5)
    ) {
        let len = a.len().max(b.len());
        let mut pa = a.clone();
        let mut pb = b.clone();
        pa.resize(len, 0);
        pb.resize(len, 0);
        let expected = VersionOrdering::from(pa.cmp(&pb));

        let sa = a.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
        let sb = b.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
        prop_assert_eq!(compare_versions(&sa, &sb), expected);
    }

    /// Property: bumping any component makes the version newer
    #[test]
    fn prop_bump_is_newer(parts in prop::collection::vec(0u64..1000, 1..5), idx in 0usize..5) {
        let idx = idx % parts.len();
        let mut bumped = parts.clone();
        bumped[idx] += 1;
        let base = parts.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
        let next = bumped.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(".");
        prop_assert!(is_newer(&next, &base));
    }
}
