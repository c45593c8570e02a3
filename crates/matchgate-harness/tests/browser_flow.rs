//! End-to-end discovery scenarios: search, probe, filter, sort.

#![allow(clippy::expect_used)]

use matchgate_app::{BrowserSettings, BrowserState};
use matchgate_core::SortColumn;
use matchgate_harness::{Scenario, SimBeacon, SimDirectory};
use matchgate_proto::{BeaconReply, RawResult, ServerFlags, SessionId, TrustTier};

fn server(session: &str, name: &str, beacon_addr: &str) -> RawResult {
    RawResult {
        session: SessionId::new(session),
        name: name.to_string(),
        connect_addr: beacon_addr.replace(":7787", ":7777"),
        beacon_addr: beacon_addr.to_string(),
        game_mode_path: "/Game/DM".to_string(),
        game_mode_name: "Deathmatch".to_string(),
        map: "DM-Core".to_string(),
        players: 0,
        spectators: 0,
        max_players: 16,
        max_spectators: 4,
        match_count: 0,
        min_rank: 0,
        max_rank: 0,
        version: "1.0".to_string(),
        flags: ServerFlags::default(),
        trust: TrustTier::Unclassified,
        is_hub: false,
    }
}

fn hub(session: &str, name: &str, beacon_addr: &str, trust: TrustTier) -> RawResult {
    let mut result = server(session, name, beacon_addr);
    result.is_hub = true;
    result.match_count = 3;
    result.trust = trust;
    result
}

fn ids(view: &[SessionId]) -> Vec<&str> {
    view.iter().map(SessionId::as_str).collect()
}

/// A scenario with unresponsive hiding off, so empty-but-slow records stay
/// visible and the ordering assertions see the whole listing.
fn scenario_showing_all(directory: SimDirectory, beacon: SimBeacon) -> Scenario {
    let settings = BrowserSettings { hide_unresponsive: false, ..BrowserSettings::default() };
    Scenario::with_settings(directory, beacon, settings, 1500)
}

#[test]
fn discovery_round_sorts_servers_by_ping() {
    let mut directory = SimDirectory::new();
    directory.push_round(vec![
        server("slow", "Slow", "10.0.0.1:7787"),
        server("fast", "Fast", "10.0.0.2:7787"),
        server("mid", "Mid", "10.0.0.3:7787"),
    ]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 240, BeaconReply::default());
    beacon.answer("10.0.0.2:7787", 12, BeaconReply::default());
    beacon.answer("10.0.0.3:7787", 80, BeaconReply::default());

    // Empty servers past the responsiveness threshold would be hidden by
    // the default settings; this test is about ordering, not hiding.
    let mut scenario = scenario_showing_all(directory, beacon);
    scenario.refresh();

    let browser = scenario.browser();
    assert_eq!(browser.state(), BrowserState::Idle);
    assert_eq!(ids(browser.server_view()), ["fast", "mid", "slow"]);

    let status = browser.status();
    assert_eq!(status.servers_known, 3);
    assert_eq!(status.probes_outstanding, 0);
}

#[test]
fn aggregate_pseudo_hub_tracks_the_server_census() {
    let mut directory = SimDirectory::new();
    let mut a = server("a", "A", "10.0.0.1:7787");
    a.players = 4;
    let mut b = server("b", "B", "10.0.0.2:7787");
    b.players = 6;
    directory.push_round(vec![a, b]);
    directory.push_round(vec![server("a", "A", "10.0.0.1:7787")]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());
    beacon.answer("10.0.0.2:7787", 30, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    let aggregate_id = SessionId::synthetic("all-servers");
    let aggregate =
        scenario.browser().record(&aggregate_id).expect("aggregate exists after a round");
    assert_eq!(aggregate.players, 10);
    assert_eq!(aggregate.match_count, 2);

    // Next round drops b; the aggregate is regenerated, not swept.
    scenario.refresh();
    let aggregate =
        scenario.browser().record(&aggregate_id).expect("aggregate survives the sweep");
    assert_eq!(aggregate.match_count, 1);
    assert_eq!(aggregate.players, 0);
    assert!(scenario.browser().record(&SessionId::new("b")).is_none());
}

#[test]
fn unresponsive_servers_are_hidden_but_not_dropped() {
    let mut directory = SimDirectory::new();
    let mut busy = server("busy", "Busy but far", "10.0.0.3:7787");
    busy.players = 9;
    directory.push_round(vec![
        server("near", "Near", "10.0.0.1:7787"),
        server("dead", "Dead", "10.0.0.2:7787"),
        busy,
    ]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 25, BeaconReply::default());
    beacon.silence("10.0.0.2:7787");
    // Far past the max(2 * best, 100) threshold, but populated.
    beacon.answer("10.0.0.3:7787", 900, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    assert_eq!(ids(scenario.browser().server_view()), ["near", "busy"]);
    // Hidden, not forgotten: the record is still in the registry.
    assert!(scenario.browser().record(&SessionId::new("dead")).is_some());

    // Showing unresponsive entries brings it back.
    let _ = scenario.browser_mut().set_hide_unresponsive(false);
    assert_eq!(scenario.browser().server_view().len(), 3);
}

#[test]
fn hub_view_orders_by_trust_then_latency() {
    let mut directory = SimDirectory::new();
    directory.push_round(vec![
        hub("wild", "Community", "10.0.1.1:7787", TrustTier::Unclassified),
        hub("official", "Official", "10.0.1.2:7787", TrustTier::FirstParty),
        hub("partner", "Partner", "10.0.1.3:7787", TrustTier::Trusted),
    ]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.1.1:7787", 1, BeaconReply::default());
    beacon.answer("10.0.1.2:7787", 250, BeaconReply::default());
    beacon.answer("10.0.1.3:7787", 11, BeaconReply::default());

    let mut scenario = scenario_showing_all(directory, beacon);
    scenario.refresh();

    // The synthetic aggregate is first-party with zero latency, so it leads.
    assert_eq!(
        ids(scenario.browser().hub_view()),
        ["@all-servers", "official", "partner", "wild"]
    );
}

#[test]
fn probe_populates_roster_rules_and_appended_metadata() {
    let mut directory = SimDirectory::new();
    directory.push_round(vec![server("a", "A", "10.0.0.1:7787")]);

    let reply = BeaconReply {
        motd: "welcome".to_string(),
        current_map: "DM-Chill".to_string(),
        roster_blob: "Alice\t12\tid-a\tBob\t7\tid-b".to_string(),
        rules_blob: "TimeLimit\t20".to_string(),
        instances: Vec::new(),
    };
    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 33, reply);

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    let record = scenario.browser().record(&SessionId::new("a")).expect("record exists");
    assert_eq!(record.ping_ms, 33);
    assert_eq!(record.map, "DM-Chill");
    assert_eq!(record.roster.len(), 2);

    let keys: Vec<&str> = record.rules.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["TimeLimit", "Address", "Port", "Version"]);
}

#[test]
fn filters_and_sort_preferences_apply_to_the_views() {
    let mut directory = SimDirectory::new();
    let mut ctf = server("c", "Flag Run", "10.0.0.3:7787");
    ctf.game_mode_name = "Capture the Flag".to_string();
    ctf.players = 8;
    directory.push_round(vec![
        server("a", "Duel Yard", "10.0.0.1:7787"),
        server("b", "Duel Pit", "10.0.0.2:7787"),
        ctf,
    ]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());
    beacon.answer("10.0.0.2:7787", 30, BeaconReply::default());
    beacon.answer("10.0.0.3:7787", 40, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    assert_eq!(
        scenario.browser().game_mode_menu(),
        ["Capture the Flag", "Deathmatch"]
    );

    let _ = scenario.browser_mut().set_filter_text("Duel".to_string());
    assert_eq!(ids(scenario.browser().server_view()), ["a", "b"]);

    let _ = scenario.browser_mut().set_filter_text(String::new());
    let _ = scenario
        .browser_mut()
        .set_game_mode_filter(Some("Capture the Flag".to_string()));
    assert_eq!(ids(scenario.browser().server_view()), ["c"]);

    // Sort choices are persisted for the next session.
    let _ = scenario.browser_mut().set_game_mode_filter(None);
    let actions = scenario.browser_mut().sort(SortColumn::Players);
    scenario.dispatch(actions);
    scenario.run();

    let persisted = scenario.persisted().expect("sort persists settings");
    assert_eq!(persisted.sort_column(), SortColumn::Players);
    assert_eq!(
        *persisted,
        BrowserSettings::capture(
            SortColumn::Players,
            persisted.sort_direction(),
            persisted.hide_unresponsive
        )
    );
}

#[test]
fn jittered_latencies_stay_deterministic_per_seed() {
    let run = || {
        let mut directory = SimDirectory::new();
        directory.push_round(vec![
            server("a", "A", "10.0.0.1:7787"),
            server("b", "B", "10.0.0.2:7787"),
        ]);
        let mut beacon = SimBeacon::new(42);
        beacon.set_jitter(50);
        beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());
        beacon.answer("10.0.0.2:7787", 20, BeaconReply::default());

        let mut scenario = Scenario::new(directory, beacon);
        scenario.refresh();
        scenario
            .browser()
            .server_view()
            .iter()
            .filter_map(|s| scenario.browser().record(s).map(|r| r.ping_ms))
            .collect::<Vec<i32>>()
    };

    assert_eq!(run(), run());
}
