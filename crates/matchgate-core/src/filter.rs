//! Filter predicates for the two listings.
//!
//! Pure functions from (listing, filter state) to an ordered set of
//! identities. The unresponsiveness policy is relative to the best latency
//! observed across the full listing in the current pass, so it is applied
//! during a full refilter rather than per probe completion.

use matchgate_proto::SessionId;

use crate::record::CandidateRecord;

/// Floor for the unresponsiveness threshold, in milliseconds.
///
/// A record is responsive if its ping is within `max(2 * best, 100)`, which
/// avoids hiding legitimately busy-but-slow servers while pruning dead
/// entries.
pub const UNRESPONSIVE_FLOOR_MS: i32 = 100;

/// User-controlled filter predicate state.
///
/// The free-text match is a case-sensitive substring match on the display
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text name filter; empty matches everything.
    pub text: String,
    /// Exact game-mode display name to match; `None` means "All".
    pub game_mode: Option<String>,
    /// Whether unresponsive records are hidden.
    pub hide_unresponsive: bool,
}

/// Lowest measured latency across a listing. `None` if no probe has
/// completed this pass.
pub fn best_ping(records: &[CandidateRecord]) -> Option<i32> {
    records.iter().filter(|r| r.has_measured_ping()).map(|r| r.ping_ms).min()
}

/// Unresponsiveness policy.
///
/// With `hide` off nothing is classified unresponsive. Otherwise a record is
/// responsive only if it has at least one active player, or its own measured
/// latency is within `max(2 * best, 100)` of the best this pass. Unmeasured
/// latency is always unresponsive.
pub fn is_unresponsive(record: &CandidateRecord, best_ping: i32, hide: bool) -> bool {
    if !hide {
        return false;
    }

    if record.has_measured_ping() {
        let worst = best_ping.saturating_mul(2).max(UNRESPONSIVE_FLOOR_MS);
        if record.players > 0 || record.ping_ms <= worst {
            return false;
        }
    }

    true
}

/// Filter the server listing: game mode, free text, responsiveness.
pub fn filter_servers(records: &[CandidateRecord], state: &FilterState) -> Vec<SessionId> {
    let best = best_ping(records).unwrap_or(0);

    records
        .iter()
        .filter(|r| match &state.game_mode {
            Some(mode) => &r.game_mode_name == mode,
            None => true,
        })
        .filter(|r| state.text.is_empty() || r.name.contains(&state.text))
        .filter(|r| !is_unresponsive(r, best, state.hide_unresponsive))
        .map(|r| r.session.clone())
        .collect()
}

/// Filter the hub listing: free text, rank gate, responsiveness.
///
/// A hub is excluded when the local player's rank falls outside its
/// advertised `[min, max]` bounds; a bound of `0` means no gate on that
/// side. Synthetic aggregates bypass the rank gate and the responsiveness
/// check.
pub fn filter_hubs(
    records: &[CandidateRecord],
    state: &FilterState,
    local_rank: u32,
) -> Vec<SessionId> {
    let best = best_ping(records).unwrap_or(0);

    records
        .iter()
        .filter(|r| state.text.is_empty() || r.name.contains(&state.text))
        .filter(|r| {
            if r.synthetic {
                return true;
            }
            let above_min = r.min_rank == 0 || local_rank >= r.min_rank;
            let below_max = r.max_rank == 0 || local_rank <= r.max_rank;
            above_min && below_max && !is_unresponsive(r, best, state.hide_unresponsive)
        })
        .map(|r| r.session.clone())
        .collect()
}
