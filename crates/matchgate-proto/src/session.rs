//! Directory-side contract types.
//!
//! A directory search returns one [`RawResult`] per advertised session. The
//! result carries everything the listing UI needs before a probe completes:
//! addresses, population, rank gate, option flags, and the operator's
//! [`TrustTier`]. The [`SessionId`] is the only field used for identity;
//! every other field is mutable between refreshes.

use serde::{Deserialize, Serialize};

/// Opaque session identity assigned by the directory.
///
/// Stable across refreshes for as long as the directory advertises the
/// session. Used for merge/update and staleness sweeps, never for display.
///
/// Synthetic records (the aggregate pseudo-hub) live in a reserved `@`
/// namespace so registry sweeps can exempt them without a side channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a directory-assigned identity token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Build an identity in the reserved synthetic namespace.
    pub fn synthetic(tag: &str) -> Self {
        Self(format!("@{tag}"))
    }

    /// Whether this identity belongs to the synthetic namespace.
    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with('@')
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operator trust classification, ordinal.
///
/// Dominant hub sort key: first-party beats trusted beats unclassified
/// regardless of latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustTier {
    /// Operated by the game's publisher.
    FirstParty,
    /// Vetted third-party operator.
    Trusted,
    /// Unknown operator.
    Unclassified,
}

impl TrustTier {
    /// Decode the directory's numeric trust level. Unknown values map to
    /// [`TrustTier::Unclassified`] (directories are not a source of hard
    /// errors).
    pub fn from_level(level: u32) -> Self {
        match level {
            0 => Self::FirstParty,
            1 => Self::Trusted,
            _ => Self::Unclassified,
        }
    }

    /// Fixed offset used by the composite hub comparator: tier dominates,
    /// latency tie-breaks within a tier (35ms first-party vs 250ms trusted
    /// vs 11ms unclassified orders as 0.035 < 100.250 < 1000.011).
    pub fn sort_offset(self) -> f32 {
        match self {
            Self::FirstParty => 0.0,
            Self::Trusted => 100.0,
            Self::Unclassified => 1000.0,
        }
    }
}

/// Option flags advertised by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerFlags(u32);

impl ServerFlags {
    /// A password is required to join.
    pub const PASSWORD_REQUIRED: Self = Self(0x0001);
    /// The session refuses players outside its skill gate.
    pub const RESTRICTED: Self = Self(0x0002);
    /// Players may join a match already in progress.
    pub const JOIN_IN_PROGRESS: Self = Self(0x0004);

    /// Wrap a raw directory flag word. Unknown bits are preserved as-is.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw flag word.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether all bits of `other` are set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of both flag sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// One directory search result.
///
/// Everything here is advertised state: it populates a candidate record on
/// discovery and is refreshed on every search. Live data (latency, roster,
/// rules, nested instances) arrives later via the beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    /// Directory-assigned identity.
    pub session: SessionId,
    /// Display name.
    pub name: String,
    /// Resolved game connect address (`host:port`).
    pub connect_addr: String,
    /// Resolved beacon probe address (`host:port`).
    pub beacon_addr: String,
    /// Game-mode identifier path (stable, machine-facing).
    pub game_mode_path: String,
    /// Game-mode display name.
    pub game_mode_name: String,
    /// Current map.
    pub map: String,
    /// Active players.
    pub players: u32,
    /// Active spectators.
    pub spectators: u32,
    /// Player capacity.
    pub max_players: u32,
    /// Spectator capacity.
    pub max_spectators: u32,
    /// Nested match instances (hubs only; zero for standalone servers).
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
    /// Whether this directory entry is a persistent hub session.
    pub is_hub: bool,
}
