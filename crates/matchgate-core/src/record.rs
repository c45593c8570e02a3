//! The in-memory representation of one discovered server or hub.

use matchgate_proto::{
    BeaconReply, InstanceSummary, RawResult, RosterEntry, RuleEntry, ServerFlags, SessionId,
    TrustTier, parse_roster, parse_rules,
};
use serde::{Deserialize, Serialize};

/// Sentinel latency for a record whose probe has not completed.
///
/// Any negative value means "not yet measured"; such a record is always
/// classified unresponsive while the hide-unresponsive filter is active.
pub const PING_UNMEASURED: i32 = -1;

/// One discovered server or hub.
///
/// Created when its identity first appears in a directory search result and
/// updated in place afterwards, so the record accumulates probe data (ping,
/// roster, rules) across refresh cycles instead of being replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Directory-assigned identity; unique within each listing.
    pub session: SessionId,
    /// Display name.
    pub name: String,
    /// Resolved game connect address.
    pub connect_addr: String,
    /// Resolved beacon probe address.
    pub beacon_addr: String,
    /// Game-mode identifier path.
    pub game_mode_path: String,
    /// Game-mode display name.
    pub game_mode_name: String,
    /// Current map.
    pub map: String,
    /// Message of the day (probe data).
    pub motd: String,
    /// Active players.
    pub players: u32,
    /// Active spectators.
    pub spectators: u32,
    /// Player capacity.
    pub max_players: u32,
    /// Spectator capacity.
    pub max_spectators: u32,
    /// Nested match instances advertised (hubs only).
    pub match_count: u32,
    /// Lower rank-gate bound; `0` means no gate.
    pub min_rank: u32,
    /// Upper rank-gate bound; `0` means no gate.
    pub max_rank: u32,
    /// Protocol/build version string.
    pub version: String,
    /// Option flags bitset.
    pub flags: ServerFlags,
    /// Operator trust classification.
    pub trust: TrustTier,
    /// Round-trip latency in milliseconds; negative = not yet measured.
    pub ping_ms: i32,
    /// Friends of the local player currently in this session.
    pub friends: u32,
    /// Live roster (probe data).
    pub roster: Vec<RosterEntry>,
    /// Live rules (probe data).
    pub rules: Vec<RuleEntry>,
    /// Nested match instance summaries (probe data, hubs only).
    pub instances: Vec<InstanceSummary>,
    /// Whether this record belongs in the hub listing.
    pub is_hub: bool,
    /// Synthetic aggregate records are regenerated, never swept.
    pub synthetic: bool,
}

impl CandidateRecord {
    /// Build a record from a fresh directory search result.
    ///
    /// Probe-derived fields start empty and the latency starts unmeasured.
    pub fn from_result(result: &RawResult) -> Self {
        Self {
            session: result.session.clone(),
            name: result.name.clone(),
            connect_addr: result.connect_addr.clone(),
            beacon_addr: result.beacon_addr.clone(),
            game_mode_path: result.game_mode_path.clone(),
            game_mode_name: result.game_mode_name.clone(),
            map: result.map.clone(),
            motd: String::new(),
            players: result.players,
            spectators: result.spectators,
            max_players: result.max_players,
            max_spectators: result.max_spectators,
            match_count: result.match_count,
            min_rank: result.min_rank,
            max_rank: result.max_rank,
            version: result.version.clone(),
            flags: result.flags,
            trust: result.trust,
            ping_ms: PING_UNMEASURED,
            friends: 0,
            roster: Vec::new(),
            rules: Vec::new(),
            instances: Vec::new(),
            is_hub: result.is_hub,
            synthetic: false,
        }
    }

    /// Merge a later search result for the same identity.
    ///
    /// Descriptive fields take the incoming values; measured latency, roster,
    /// rules, and instances are kept unless the result indicates a materially
    /// different match (map or game mode changed), in which case the probe
    /// data is stale and cleared.
    pub fn merge_result(&mut self, result: &RawResult) {
        let changed_match =
            self.map != result.map || self.game_mode_path != result.game_mode_path;

        self.name = result.name.clone();
        self.connect_addr = result.connect_addr.clone();
        self.beacon_addr = result.beacon_addr.clone();
        self.game_mode_path = result.game_mode_path.clone();
        self.game_mode_name = result.game_mode_name.clone();
        self.map = result.map.clone();
        self.players = result.players;
        self.spectators = result.spectators;
        self.max_players = result.max_players;
        self.max_spectators = result.max_spectators;
        self.match_count = result.match_count;
        self.min_rank = result.min_rank;
        self.max_rank = result.max_rank;
        self.version = result.version.clone();
        self.flags = result.flags;
        self.trust = result.trust;
        self.is_hub = result.is_hub;

        if changed_match {
            self.ping_ms = PING_UNMEASURED;
            self.roster.clear();
            self.rules.clear();
            self.instances.clear();
        }
    }

    /// Apply a completed beacon probe.
    ///
    /// Overwrites the stale live fields: latency, MOTD, current map, roster,
    /// rules, and nested instances. The address and version are appended to
    /// the rules so the detail pane can show them alongside the server's own
    /// entries.
    pub fn apply_probe(&mut self, ping_ms: u32, reply: &BeaconReply) {
        // An absurd latency must not wrap into the unmeasured sentinel.
        self.ping_ms = i32::try_from(ping_ms).unwrap_or(i32::MAX);
        self.motd = reply.motd.clone();
        if !reply.current_map.is_empty() {
            self.map = reply.current_map.clone();
        }

        self.roster = parse_roster(&reply.roster_blob);
        self.rules = parse_rules(&reply.rules_blob);

        match self.connect_addr.split_once(':') {
            Some((host, port)) => {
                self.rules.push(RuleEntry { key: "Address".into(), value: host.to_string() });
                self.rules.push(RuleEntry { key: "Port".into(), value: port.to_string() });
            },
            None => {
                self.rules
                    .push(RuleEntry { key: "Address".into(), value: self.connect_addr.clone() });
            },
        }
        self.rules.push(RuleEntry { key: "Version".into(), value: self.version.clone() });

        self.instances = reply.instances.clone();
    }

    /// Whether a probe has completed for this record.
    pub fn has_measured_ping(&self) -> bool {
        self.ping_ms >= 0
    }

    /// Build the synthetic "all standalone servers" pseudo-hub.
    ///
    /// Carries the summed population of the server listing and the standalone
    /// server count as its match count. Regenerated whenever the census
    /// changes, never swept.
    pub fn aggregate_hub(
        name: &str,
        players: u32,
        spectators: u32,
        friends: u32,
        server_count: u32,
    ) -> Self {
        Self {
            session: SessionId::synthetic("all-servers"),
            name: name.to_string(),
            connect_addr: String::new(),
            beacon_addr: String::new(),
            game_mode_path: String::new(),
            game_mode_name: "Hub".to_string(),
            map: String::new(),
            motd: "Browse the standalone servers as one collection.".to_string(),
            players,
            spectators,
            max_players: 0,
            max_spectators: 0,
            match_count: server_count,
            min_rank: 0,
            max_rank: 0,
            version: String::new(),
            flags: ServerFlags::default(),
            trust: TrustTier::FirstParty,
            ping_ms: 0,
            friends,
            roster: Vec::new(),
            rules: Vec::new(),
            instances: Vec::new(),
            is_hub: true,
            synthetic: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use matchgate_proto::{RawResult, ServerFlags, SessionId, TrustTier};

    use super::{BeaconReply, CandidateRecord, PING_UNMEASURED};

    pub(crate) fn raw(session: &str, name: &str) -> RawResult {
        RawResult {
            session: SessionId::new(session),
            name: name.to_string(),
            connect_addr: "10.0.0.1:7777".to_string(),
            beacon_addr: "10.0.0.1:7787".to_string(),
            game_mode_path: "/Game/DM".to_string(),
            game_mode_name: "Deathmatch".to_string(),
            map: "DM-Core".to_string(),
            players: 4,
            spectators: 1,
            max_players: 16,
            max_spectators: 4,
            match_count: 0,
            min_rank: 0,
            max_rank: 0,
            version: "1.0.3".to_string(),
            flags: ServerFlags::default(),
            trust: TrustTier::Unclassified,
            is_hub: false,
        }
    }

    #[test]
    fn new_record_starts_unmeasured() {
        let record = CandidateRecord::from_result(&raw("a", "Server A"));
        assert_eq!(record.ping_ms, PING_UNMEASURED);
        assert!(!record.has_measured_ping());
        assert!(record.roster.is_empty());
    }

    #[test]
    fn merge_keeps_probe_data_for_same_match() {
        let mut record = CandidateRecord::from_result(&raw("a", "Server A"));
        let reply = BeaconReply {
            motd: "welcome".into(),
            current_map: "DM-Core".into(),
            roster_blob: "Alice\t3\tid-a".into(),
            rules_blob: String::new(),
            instances: Vec::new(),
        };
        record.apply_probe(42, &reply);

        let mut update = raw("a", "Server A (renamed)");
        update.players = 9;
        record.merge_result(&update);

        assert_eq!(record.name, "Server A (renamed)");
        assert_eq!(record.players, 9);
        assert_eq!(record.ping_ms, 42);
        assert_eq!(record.roster.len(), 1);
    }

    #[test]
    fn merge_clears_probe_data_on_map_change() {
        let mut record = CandidateRecord::from_result(&raw("a", "Server A"));
        record.apply_probe(42, &BeaconReply::default());

        let mut update = raw("a", "Server A");
        update.map = "DM-Chill".to_string();
        record.merge_result(&update);

        assert_eq!(record.ping_ms, PING_UNMEASURED);
        assert!(record.rules.is_empty());
    }

    #[test]
    fn probe_appends_address_and_version_rules() {
        let mut record = CandidateRecord::from_result(&raw("a", "Server A"));
        record.apply_probe(18, &BeaconReply::default());

        let keys: Vec<&str> = record.rules.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["Address", "Port", "Version"]);
        assert_eq!(record.rules[0].value, "10.0.0.1");
        assert_eq!(record.rules[1].value, "7777");
    }

    #[test]
    fn probe_latency_saturates_instead_of_wrapping() {
        let mut record = CandidateRecord::from_result(&raw("a", "Server A"));
        record.apply_probe(u32::MAX, &BeaconReply::default());

        assert_eq!(record.ping_ms, i32::MAX);
        assert!(record.has_measured_ping());
    }

    #[test]
    fn aggregate_hub_is_synthetic() {
        let hub = CandidateRecord::aggregate_hub("All Servers", 12, 3, 2, 7);
        assert!(hub.synthetic);
        assert!(hub.session.is_synthetic());
        assert_eq!(hub.match_count, 7);
        assert!(hub.has_measured_ping());
    }
}
