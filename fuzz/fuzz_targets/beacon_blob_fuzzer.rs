//! Fuzz target for the beacon blob parsers
//!
//! Beacons return free-form tab-delimited text, so the parsers face
//! arbitrary bytes from the network.
//!
//! # Invariants
//!
//! - Never panics on any input
//! - Parsed entries contain no empty fields (empty fields are culled)
//! - Entry counts are bounded by the number of delimited fields

#![no_main]

use libfuzzer_sys::fuzz_target;
use matchgate_proto::{parse_roster, parse_rules};

fuzz_target!(|blob: &str| {
    let fields = blob.split('\t').filter(|f| !f.is_empty()).count();

    let roster = parse_roster(blob);
    assert!(roster.len() <= fields / 3);
    for entry in &roster {
        assert!(!entry.name.is_empty());
        assert!(!entry.score.is_empty());
        assert!(!entry.id.is_empty());
    }

    let rules = parse_rules(blob);
    assert!(rules.len() <= fields / 2);
    for rule in &rules {
        assert!(!rule.key.is_empty());
        assert!(!rule.value.is_empty());
    }
});
