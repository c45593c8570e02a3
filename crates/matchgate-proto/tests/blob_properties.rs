//! Property tests for the beacon blob parsers.
//!
//! The blobs arrive as free-form text from untrusted beacons, so the
//! parsers must be total: any input yields a (possibly empty) entry list.

use proptest::prelude::*;

use matchgate_proto::{parse_roster, parse_rules};

proptest! {
    #[test]
    fn roster_parser_is_total(blob in ".*") {
        let roster = parse_roster(&blob);
        for entry in &roster {
            prop_assert!(!entry.name.is_empty());
            prop_assert!(!entry.score.is_empty());
            prop_assert!(!entry.id.is_empty());
        }
    }

    #[test]
    fn rules_parser_is_total(blob in ".*") {
        let rules = parse_rules(&blob);
        for rule in &rules {
            prop_assert!(!rule.key.is_empty());
            prop_assert!(!rule.value.is_empty());
        }
    }

    #[test]
    fn well_formed_rosters_round_trip(
        entries in prop::collection::vec(("[a-zA-Z]{1,12}", "[0-9]{1,4}", "[a-f0-9]{8}"), 0..8)
    ) {
        let blob: Vec<String> = entries
            .iter()
            .flat_map(|(name, score, id)| [name.clone(), score.clone(), id.clone()])
            .collect();
        let roster = parse_roster(&blob.join("\t"));

        prop_assert_eq!(roster.len(), entries.len());
        for (parsed, (name, score, id)) in roster.iter().zip(&entries) {
            prop_assert_eq!(&parsed.name, name);
            prop_assert_eq!(&parsed.score, score);
            prop_assert_eq!(&parsed.id, id);
        }
    }

    #[test]
    fn truncated_rosters_keep_the_complete_prefix(
        entries in prop::collection::vec(("[a-zA-Z]{1,12}", "[0-9]{1,4}", "[a-f0-9]{8}"), 1..8),
        cut in 1_usize..3,
    ) {
        let mut fields: Vec<String> = entries
            .iter()
            .flat_map(|(name, score, id)| [name.clone(), score.clone(), id.clone()])
            .collect();
        fields.truncate(fields.len() - cut);

        let roster = parse_roster(&fields.join("\t"));
        prop_assert_eq!(roster.len(), entries.len() - 1);
    }
}
