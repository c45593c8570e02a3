//! Beacon-side contract types and blob parsers.
//!
//! A beacon probe answers with free-form status text: the roster and rules
//! are flat tab-delimited blobs rather than structured data, so the parsers
//! here are deliberately lenient. Beacons are eventually consistent status
//! reporters, not a source of hard errors: malformed trailing tuples are
//! dropped, empty fields are skipped, and an empty blob parses to an empty
//! list.

use serde::{Deserialize, Serialize};

use crate::session::ServerFlags;

/// Live status returned by a successful beacon probe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeaconReply {
    /// Message of the day.
    pub motd: String,
    /// Map currently being played (may differ from the advertised one).
    pub current_map: String,
    /// Tab-delimited `(name, score, id)` triples; see [`parse_roster`].
    pub roster_blob: String,
    /// Tab-delimited `(key, value)` pairs; see [`parse_rules`].
    pub rules_blob: String,
    /// Nested match instances running inside a hub.
    pub instances: Vec<InstanceSummary>,
}

/// One nested match instance inside a hub session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    /// Instance identity within its hub.
    pub instance_id: String,
    /// Display name.
    pub name: String,
    /// Game-mode identifier path.
    pub game_mode_path: String,
    /// Active players.
    pub players: u32,
    /// Player capacity.
    pub max_players: u32,
    /// Option flags bitset.
    pub flags: ServerFlags,
}

/// One roster line as reported by the beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Player display name.
    pub name: String,
    /// Score, as reported (free-form text).
    pub score: String,
    /// Player identity token.
    pub id: String,
}

/// One rule as reported by the beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Rule key.
    pub key: String,
    /// Rule value.
    pub value: String,
}

/// Parse the roster blob into `(name, score, id)` entries.
///
/// Fields are tab-delimited with empty fields culled. A trailing partial
/// triple is dropped.
pub fn parse_roster(blob: &str) -> Vec<RosterEntry> {
    let fields: Vec<&str> = blob.split('\t').filter(|f| !f.is_empty()).collect();
    fields
        .chunks_exact(3)
        .map(|triple| RosterEntry {
            name: triple[0].to_string(),
            score: triple[1].to_string(),
            id: triple[2].to_string(),
        })
        .collect()
}

/// Parse the rules blob into `(key, value)` entries.
///
/// Fields are tab-delimited with empty fields culled. A trailing key with no
/// value is dropped.
pub fn parse_rules(blob: &str) -> Vec<RuleEntry> {
    let fields: Vec<&str> = blob.split('\t').filter(|f| !f.is_empty()).collect();
    fields
        .chunks_exact(2)
        .map(|pair| RuleEntry { key: pair[0].to_string(), value: pair[1].to_string() })
        .collect()
}
