//! Directory result classification and connect-URL assembly.

use matchgate_core::Listing;
use matchgate_proto::RawResult;

use crate::orchestrator::ConnectionIntent;

/// Which listing a directory result belongs to.
///
/// Hubs and standalone servers are browsed separately; the directory marks
/// hubs explicitly rather than leaving the split to heuristics.
pub fn listing_for(result: &RawResult) -> Listing {
    if result.is_hub { Listing::Hubs } else { Listing::Servers }
}

/// Assemble the travel URL from the resolved connect string and the intent.
///
/// Options use `?Key=Value` segments appended to the bare `host:port` base.
/// The order is fixed so the produced URL is reproducible for a given
/// intent: quick-match tag, friend correlation id, ranked-match request,
/// spectator flag (always present, `0` or `1`), team, then match instance.
pub fn connect_url(base: &str, intent: &ConnectionIntent) -> String {
    let mut url = base.to_string();
    if let Some(tag) = &intent.quick_match {
        url.push_str("?QuickMatch=");
        url.push_str(tag);
    }
    if let Some(friend) = &intent.friend_id {
        url.push_str("?Friend=");
        url.push_str(friend);
    }
    if intent.find_ranked {
        url.push_str("?RTM=1");
    }
    url.push_str(if intent.spectate { "?SpectatorOnly=1" } else { "?SpectatorOnly=0" });
    if let Some(team) = intent.team {
        url.push_str(&format!("?Team={team}"));
    }
    if let Some(match_id) = &intent.match_id {
        url.push_str("?MatchId=");
        url.push_str(match_id);
    }
    url
}
