//! Property-based tests for the pact document model.
//!
//! Tests validate:
//! - Documents written at a version and read back are equal to the original
//! - Writing below a document's features fails instead of dropping them
//! - Merging pacts deduplicates interactions by unique key
//! - Path expression weights favour concrete segments

use pact_common::PactError;
use pact_models::{DocPath, Interaction, Pact, PactSpecVersion};
use proptest::prelude::*;
use std::collections::HashSet;
use test_utils::{message_pact_strategy, pact_strategy, participant_name_strategy};

fn version_strategy() -> impl Strategy<Value = PactSpecVersion> {
    prop_oneof![
        Just(PactSpecVersion::V2),
        Just(PactSpecVersion::V3),
        Just(PactSpecVersion::V4),
    ]
}

fn unique_keys(pact: &Pact) -> HashSet<String> {
    pact.interactions().iter().map(Interaction::unique_key).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_http_pact_round_trip(
        (version, pact) in version_strategy().prop_flat_map(|v| (Just(v), pact_strategy(v)))
    ) {
        let json = pact.to_json(version).expect("pact should serialize");
        let parsed = Pact::from_json(&json).expect("pact should parse");
        prop_assert_eq!(&parsed, &pact);
        prop_assert_eq!(parsed.spec_version(), version);
    }

    #[test]
    fn prop_message_pact_round_trip(
        (version, pact) in prop_oneof![Just(PactSpecVersion::V3), Just(PactSpecVersion::V4)]
            .prop_flat_map(|v| (Just(v), message_pact_strategy(v)))
    ) {
        let json = pact.to_json(version).expect("pact should serialize");
        let parsed = Pact::from_json(&json).expect("pact should parse");
        prop_assert_eq!(parsed, pact);
    }

    /// Writing a V3 pact at V2 either fails validation or loses nothing.
    #[test]
    fn prop_v2_write_never_drops_content(pact in pact_strategy(PactSpecVersion::V3)) {
        let problems = pact.validate_for_version(PactSpecVersion::V2);
        match pact.to_json(PactSpecVersion::V2) {
            Ok(json) => {
                prop_assert!(problems.is_empty());
                prop_assert_eq!(Pact::from_json(&json).expect("pact should parse"), pact);
            }
            Err(err) => {
                prop_assert!(matches!(err, PactError::InvalidPact(_)), "unexpected error {}", err);
                prop_assert!(!problems.is_empty());
            }
        }
    }

    #[test]
    fn prop_round_trip_is_stable(pact in pact_strategy(PactSpecVersion::V3)) {
        let once = pact.to_json(PactSpecVersion::V3).expect("serialize");
        let twice = Pact::from_json(&once).expect("parse").to_json(PactSpecVersion::V3).expect("serialize");
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_deduplicates_by_unique_key(
        a in pact_strategy(PactSpecVersion::V3),
        b in pact_strategy(PactSpecVersion::V3),
    ) {
        // reuse a's participants so the pacts can be merged
        let b = match (b, &a) {
            (Pact::RequestResponse(mut b), Pact::RequestResponse(a)) => {
                b.consumer = a.consumer.clone();
                b.provider = a.provider.clone();
                Pact::RequestResponse(b)
            }
            (b, _) => b,
        };

        let merged = a.merge(&b).expect("merge should succeed");
        let expected: HashSet<String> = unique_keys(&a).union(&unique_keys(&b)).cloned().collect();
        prop_assert_eq!(merged.interaction_count(), expected.len());
        prop_assert_eq!(unique_keys(&merged), expected);
    }

    #[test]
    fn prop_merge_with_self_is_identity_on_keys(pact in pact_strategy(PactSpecVersion::V3)) {
        let merged = pact.merge(&pact).expect("merge should succeed");
        prop_assert_eq!(merged.interaction_count(), pact.interaction_count());
    }

    #[test]
    fn prop_merge_requires_same_participants(
        pact in pact_strategy(PactSpecVersion::V3),
        other_consumer in participant_name_strategy(),
    ) {
        prop_assume!(&other_consumer != &pact.consumer().name);
        let other = match pact.clone() {
            Pact::RequestResponse(mut p) => {
                p.consumer.name = other_consumer;
                Pact::RequestResponse(p)
            }
            Pact::Message(p) => Pact::Message(p),
        };
        prop_assert!(pact.merge(&other).is_err());
    }

    #[test]
    fn prop_concrete_paths_outweigh_wildcards(
        field in "[a-z]{1,8}",
        index in 0usize..20,
        leaf in "[a-z]{1,8}",
    ) {
        let concrete = DocPath::parse(&format!("$.{field}[{index}].{leaf}")).expect("valid path");
        let exact = DocPath::parse(&format!("$.{field}[{index}].{leaf}")).expect("valid path");
        let wildcard = DocPath::parse(&format!("$.{field}[*].{leaf}")).expect("valid path");
        let star = DocPath::parse(&format!("$.*[*].{leaf}")).expect("valid path");

        let w_exact = exact.match_weight(&concrete);
        let w_wildcard = wildcard.match_weight(&concrete);
        let w_star = star.match_weight(&concrete);
        prop_assert!(w_exact > w_wildcard);
        prop_assert!(w_wildcard > w_star);
        prop_assert!(w_star > 0);
    }

    #[test]
    fn prop_path_display_round_trip(
        fields in prop::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,8}|[a-z]{1,4} [a-z]{1,4}", 1..4),
        index in prop::option::of(0usize..10),
    ) {
        let mut path = DocPath::root();
        for field in &fields {
            path = path.join(field.clone());
        }
        if let Some(index) = index {
            path = path.join_index(index);
        }
        let reparsed = DocPath::parse(&path.to_string()).expect("rendered path should parse");
        prop_assert_eq!(reparsed, path);
    }
}
