//! Join orchestration scenarios: travel, teardown, coalescing, failures.

#![allow(clippy::expect_used)]

use matchgate_app::{Browser, BrowserAction, BrowserEvent, BrowserSettings, BrowserState};
use matchgate_client::{
    JoinOutcome, JoinTarget, OrchestratorAction, OrchestratorEvent, PingConfig, ProbeAction,
};
use matchgate_harness::{FriendLookup, Scenario, SimBeacon, SimDirectory};
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

fn two_server_scenario() -> Scenario {
    let mut directory = SimDirectory::new();
    directory.push_round(vec![
        server("a", "A", "10.0.0.1:7787"),
        server("b", "B", "10.0.0.2:7787"),
    ]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());
    beacon.answer("10.0.0.2:7787", 30, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();
    scenario
}

#[test]
fn join_selected_travels_with_the_spectator_flag() {
    let mut scenario = two_server_scenario();

    scenario.select(SessionId::new("a"));
    scenario.join_selected(false);

    assert_eq!(scenario.travelled(), ["10.0.0.1:7777?SpectatorOnly=0"]);
    assert!(scenario.browser().orchestrator().session_held());

    let mut scenario = two_server_scenario();
    scenario.select(SessionId::new("a"));
    scenario.join_selected(true);
    assert_eq!(scenario.travelled(), ["10.0.0.1:7777?SpectatorOnly=1"]);
}

#[test]
fn joining_a_second_server_tears_down_the_first() {
    let mut scenario = two_server_scenario();

    scenario.select(SessionId::new("a"));
    scenario.join_selected(false);
    scenario.select(SessionId::new("b"));
    scenario.join_selected(false);

    assert_eq!(scenario.travelled(), [
        "10.0.0.1:7777?SpectatorOnly=0",
        "10.0.0.2:7777?SpectatorOnly=0",
    ]);
    assert!(scenario.browser().orchestrator().session_held());
}

#[test]
fn failed_join_surfaces_on_the_status_line_and_is_recoverable() {
    let mut directory = SimDirectory::new();
    directory.push_round(vec![
        server("full", "Full", "10.0.0.1:7787"),
        server("open", "Open", "10.0.0.2:7787"),
    ]);
    directory.set_join_outcome(SessionId::new("full"), JoinOutcome::SessionFull);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());
    beacon.answer("10.0.0.2:7787", 30, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    scenario.select(SessionId::new("full"));
    scenario.join_selected(false);

    assert!(scenario.travelled().is_empty());
    let message = scenario.browser().status_message().expect("failure must be surfaced");
    assert!(message.contains("full"), "unexpected message: {message}");

    // Not wedged: the next join goes through.
    scenario.select(SessionId::new("open"));
    scenario.join_selected(false);
    assert_eq!(scenario.travelled(), ["10.0.0.2:7777?SpectatorOnly=0"]);
}

#[test]
fn restricted_server_is_refused_without_a_directory_call() {
    let mut directory = SimDirectory::new();
    let mut gated = server("gated", "Gated", "10.0.0.1:7787");
    gated.flags = ServerFlags::RESTRICTED;
    directory.push_round(vec![gated]);

    let mut beacon = SimBeacon::new(7);
    beacon.answer("10.0.0.1:7787", 20, BeaconReply::default());

    let mut scenario = Scenario::new(directory, beacon);
    scenario.refresh();

    scenario.select(SessionId::new("gated"));
    scenario.join_selected(false);

    assert!(scenario.travelled().is_empty());
    let message = scenario.browser().status_message().expect("refusal must be surfaced");
    assert!(message.contains("skill rating"), "unexpected message: {message}");
}

#[test]
fn friend_join_carries_the_correlation_parameter() {
    let mut scenario = two_server_scenario();
    scenario
        .directory_mut()
        .set_friend("friend-7", FriendLookup::Found(server("hub", "Hub", "10.0.2.1:7787")));

    scenario.join_friend("friend-7");

    assert_eq!(scenario.travelled(), ["10.0.2.1:7777?Friend=friend-7?SpectatorOnly=0"]);
}

#[test]
fn friend_lookup_failures_report_distinctly() {
    let mut scenario = two_server_scenario();
    scenario.directory_mut().set_friend("afk", FriendLookup::NotInSession);

    scenario.join_friend("afk");
    let missing = scenario.browser().status_message().map(str::to_string);

    scenario.join_friend("stranger");
    let failed = scenario.browser().status_message().map(str::to_string);

    assert!(missing.is_some());
    assert!(failed.is_some());
    assert_ne!(missing, failed);
    assert!(scenario.travelled().is_empty());
}

// The interleaved cases below drive the browser by hand so teardown can be
// suspended mid-flight.

fn manual_browser(pool_limit: usize) -> Browser {
    let mut browser = Browser::with_probe_config(
        &BrowserSettings::default(),
        1500,
        PingConfig { pool_limit },
    );
    let _ = browser.handle(BrowserEvent::LoginCompleted);
    browser
}

fn session_event(event: OrchestratorEvent) -> BrowserEvent {
    BrowserEvent::Session(event)
}

fn join_target(actions: &[BrowserAction]) -> Option<&str> {
    actions.iter().find_map(|a| match a {
        BrowserAction::Session(OrchestratorAction::JoinSession {
            target: JoinTarget::Result(result),
        }) => Some(result.session.as_str()),
        _ => None,
    })
}

#[test]
fn teardown_coalesces_to_the_latest_intent() {
    let mut browser = manual_browser(30);
    let _ = browser.refresh();
    let _ = browser.handle(BrowserEvent::SearchCompleted {
        results: vec![
            server("a", "A", "10.0.0.1:7787"),
            server("x", "X", "10.0.0.2:7787"),
            server("y", "Y", "10.0.0.3:7787"),
        ],
    });

    // Establish a session on a.
    let _ = browser.select(SessionId::new("a"));
    let _ = browser.join_selected(false);
    let _ = browser.handle(session_event(OrchestratorEvent::JoinCompleted {
        outcome: JoinOutcome::Success,
    }));
    let _ = browser.handle(session_event(OrchestratorEvent::ConnectStringResolved {
        connect: "10.0.0.1:7777".to_string(),
    }));
    let _ = browser.handle(session_event(OrchestratorEvent::TravelCompleted));
    assert!(browser.orchestrator().session_held());

    // Request x: teardown starts. Request y before it completes.
    let _ = browser.select(SessionId::new("x"));
    let actions = browser.join_selected(false);
    assert!(actions.contains(&BrowserAction::Session(OrchestratorAction::EndSession)));

    let _ = browser.select(SessionId::new("y"));
    let actions = browser.join_selected(false);
    assert_eq!(join_target(&actions), None);

    let actions = browser.handle(session_event(OrchestratorEvent::EndSessionCompleted));
    assert!(actions.contains(&BrowserAction::Session(OrchestratorAction::DestroySession)));

    // Exactly one join is issued, for the latest intent.
    let actions = browser.handle(session_event(OrchestratorEvent::DestroySessionCompleted));
    assert_eq!(join_target(&actions), Some("y"));
}

fn open_probes(actions: &[BrowserAction]) -> Vec<matchgate_client::ProbeId> {
    actions
        .iter()
        .filter_map(|a| match a {
            BrowserAction::Probe(ProbeAction::Open { probe, .. }) => Some(*probe),
            _ => None,
        })
        .collect()
}

#[test]
fn probe_pool_bound_holds_during_a_round() {
    let mut browser = manual_browser(2);
    let _ = browser.refresh();

    let actions = browser.handle(BrowserEvent::SearchCompleted {
        results: vec![
            server("a", "A", "10.0.0.1:7787"),
            server("b", "B", "10.0.0.2:7787"),
            server("c", "C", "10.0.0.3:7787"),
        ],
    });

    let first_wave = open_probes(&actions);
    assert_eq!(first_wave.len(), 2, "pool limit must cap the first wave");

    // One completion frees one slot: exactly one more probe opens.
    let actions = browser.handle(BrowserEvent::ProbeCompleted {
        probe: first_wave[0],
        ping_ms: 20,
        reply: BeaconReply::default(),
    });
    let second_wave = open_probes(&actions);
    assert_eq!(second_wave.len(), 1);
    assert_eq!(browser.state(), BrowserState::Refreshing);

    // Settle the rest: the round drains and the browser goes idle.
    let _ = browser.handle(BrowserEvent::ProbeCompleted {
        probe: first_wave[1],
        ping_ms: 25,
        reply: BeaconReply::default(),
    });
    let _ = browser.handle(BrowserEvent::ProbeCompleted {
        probe: second_wave[0],
        ping_ms: 30,
        reply: BeaconReply::default(),
    });
    assert_eq!(browser.state(), BrowserState::Idle);
    assert_eq!(browser.server_view().len(), 3);
}

#[test]
fn overlapping_refreshes_coalesce_into_one_refilter() {
    let mut browser = manual_browser(30);
    let _ = browser.refresh();

    let results =
        vec![server("a", "A", "10.0.0.1:7787"), server("b", "B", "10.0.0.2:7787")];
    let actions = browser.handle(BrowserEvent::SearchCompleted { results: results.clone() });
    let probes = open_probes(&actions);
    assert_eq!(probes.len(), 2);

    // Settle one, then refresh again mid-round.
    let _ = browser.handle(BrowserEvent::ProbeCompleted {
        probe: probes[0],
        ping_ms: 20,
        reply: BeaconReply::default(),
    });
    let actions = browser.refresh();
    assert!(
        actions
            .iter()
            .any(|a| matches!(a, BrowserAction::Probe(ProbeAction::Cancel { .. }))),
        "a new round must cancel the old one's probes"
    );

    let actions = browser.handle(BrowserEvent::SearchCompleted { results });
    let probes = open_probes(&actions);
    assert_eq!(probes.len(), 2, "survivors are re-probed");
    assert_eq!(browser.state(), BrowserState::Refreshing);

    // The round stays open until the final drain, then goes idle once.
    let _ = browser.handle(BrowserEvent::ProbeCompleted {
        probe: probes[0],
        ping_ms: 20,
        reply: BeaconReply::default(),
    });
    assert_eq!(browser.state(), BrowserState::Refreshing);
    let _ = browser.handle(BrowserEvent::ProbeCompleted {
        probe: probes[1],
        ping_ms: 22,
        reply: BeaconReply::default(),
    });
    assert_eq!(browser.state(), BrowserState::Idle);
}
