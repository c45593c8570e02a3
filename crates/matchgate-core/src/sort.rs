//! Ordering for the filtered views.
//!
//! One parameterized comparator keyed by [`SortColumn`] plus a direction
//! flag, instead of a named comparator type per column. All sorts are stable
//! so records that compare equal keep their registry order.

use std::cmp::Ordering;

use matchgate_proto::SessionId;
use serde::{Deserialize, Serialize};

use crate::record::CandidateRecord;

/// Sortable columns of the server listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortColumn {
    /// Display name.
    Name,
    /// Connect address.
    Address,
    /// Game-mode display name.
    GameMode,
    /// Current map.
    Map,
    /// Active player count.
    Players,
    /// Active spectator count.
    Spectators,
    /// Friends present.
    Friends,
    /// Version string.
    Version,
    /// Measured latency.
    Ping,
}

impl SortColumn {
    /// Stable name used by the external settings store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::GameMode => "game_mode",
            Self::Map => "map",
            Self::Players => "players",
            Self::Spectators => "spectators",
            Self::Friends => "friends",
            Self::Version => "version",
            Self::Ping => "ping",
        }
    }

    /// Decode a persisted column name. Unknown names fall back to `None` so
    /// a stale settings entry cannot wedge the browser.
    pub fn from_persisted(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "game_mode" => Some(Self::GameMode),
            "map" => Some(Self::Map),
            "players" => Some(Self::Players),
            "spectators" => Some(Self::Spectators),
            "friends" => Some(Self::Friends),
            "version" => Some(Self::Version),
            "ping" => Some(Self::Ping),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// The opposite direction (repeated clicks on a column toggle).
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Latency as a sort key: unmeasured is worse than any measured value, in
/// both directions.
fn ping_key(record: &CandidateRecord) -> i64 {
    if record.has_measured_ping() { i64::from(record.ping_ms) } else { i64::MAX }
}

fn compare_by(a: &CandidateRecord, b: &CandidateRecord, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Address => a.connect_addr.cmp(&b.connect_addr),
        SortColumn::GameMode => a.game_mode_name.cmp(&b.game_mode_name),
        SortColumn::Map => a.map.cmp(&b.map),
        SortColumn::Players => a.players.cmp(&b.players),
        SortColumn::Spectators => a.spectators.cmp(&b.spectators),
        SortColumn::Friends => a.friends.cmp(&b.friends),
        SortColumn::Version => a.version.cmp(&b.version),
        SortColumn::Ping => ping_key(a).cmp(&ping_key(b)),
    }
}

/// Sort a filtered server view in place.
///
/// Identities missing from the listing (a view raced a sweep) sort last and
/// keep their relative order.
pub fn sort_server_view(
    records: &[CandidateRecord],
    view: &mut [SessionId],
    column: SortColumn,
    direction: SortDirection,
) {
    let lookup = |session: &SessionId| records.iter().find(|r| &r.session == session);

    view.sort_by(|a, b| {
        let ordering = match (lookup(a), lookup(b)) {
            (Some(ra), Some(rb)) => compare_by(ra, rb, column),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Composite score ordering the hub view: trust tier is dominant, latency
/// tie-breaks within a tier.
fn hub_score(record: &CandidateRecord) -> f32 {
    record.trust.sort_offset() + record.ping_ms.max(0) as f32 / 1000.0
}

/// Sort a filtered hub view in place by the composite trust/latency score.
pub fn sort_hub_view(records: &[CandidateRecord], view: &mut [SessionId]) {
    let lookup = |session: &SessionId| records.iter().find(|r| &r.session == session);

    view.sort_by(|a, b| match (lookup(a), lookup(b)) {
        (Some(ra), Some(rb)) => {
            hub_score(ra).partial_cmp(&hub_score(rb)).unwrap_or(Ordering::Equal)
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
