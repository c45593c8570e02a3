//! Fuzz target for the join orchestrator state machine
//!
//! Drives arbitrary interleavings of join requests and session callbacks,
//! including callbacks arriving in states that never request them.
//!
//! # Invariants
//!
//! - Never panics on any event ordering
//! - At most one stashed pending intent at any time
//! - A join request while one is in flight is an error, never a second join
//! - Every action batch contains at most one directory join

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use matchgate_client::{
    ConnectionIntent, ConnectionOrchestrator, JoinOutcome, JoinTarget, OrchestratorAction,
    OrchestratorEvent,
};
use matchgate_proto::{RawResult, ServerFlags, SessionId, TrustTier};

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    RequestJoin { session: u8, spectate: bool, restricted: bool },
    JoinFriend { friend: u8 },
    LoginCompleted,
    LoginFailed,
    EndSessionCompleted,
    DestroySessionCompleted,
    JoinSucceeded,
    JoinFull,
    JoinNotFound,
    ConnectResolved,
    ConnectFailed,
    FriendFound { session: u8 },
    FriendMissing,
    TravelCompleted,
    SessionVerified { session: u8 },
}

fn result(session: u8, restricted: bool) -> RawResult {
    RawResult {
        session: SessionId::new(format!("s-{session}")),
        name: format!("Server {session}"),
        connect_addr: "10.0.0.1:7777".to_string(),
        beacon_addr: "10.0.0.1:7787".to_string(),
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
        flags: if restricted { ServerFlags::RESTRICTED } else { ServerFlags::default() },
        trust: TrustTier::Unclassified,
        is_hub: false,
    }
}

fn event_of(op: Op) -> Option<OrchestratorEvent> {
    Some(match op {
        Op::RequestJoin { .. } | Op::JoinFriend { .. } => return None,
        Op::LoginCompleted => OrchestratorEvent::LoginCompleted,
        Op::LoginFailed => OrchestratorEvent::LoginFailed { reason: "denied".to_string() },
        Op::EndSessionCompleted => OrchestratorEvent::EndSessionCompleted,
        Op::DestroySessionCompleted => OrchestratorEvent::DestroySessionCompleted,
        Op::JoinSucceeded => {
            OrchestratorEvent::JoinCompleted { outcome: JoinOutcome::Success }
        }
        Op::JoinFull => OrchestratorEvent::JoinCompleted { outcome: JoinOutcome::SessionFull },
        Op::JoinNotFound => OrchestratorEvent::JoinCompleted { outcome: JoinOutcome::NotFound },
        Op::ConnectResolved => OrchestratorEvent::ConnectStringResolved {
            connect: "10.0.0.1:7777".to_string(),
        },
        Op::ConnectFailed => OrchestratorEvent::ConnectStringFailed,
        Op::FriendFound { session } => OrchestratorEvent::FriendSessionFound {
            result: result(session, false),
            friend_id: "friend".to_string(),
        },
        Op::FriendMissing => OrchestratorEvent::FriendSessionMissing,
        Op::TravelCompleted => OrchestratorEvent::TravelCompleted,
        Op::SessionVerified { session } => {
            OrchestratorEvent::SessionVerified { result: result(session, false) }
        }
    })
}

fn check_actions(actions: &[OrchestratorAction]) {
    let joins = actions
        .iter()
        .filter(|a| matches!(a, OrchestratorAction::JoinSession { .. }))
        .count();
    assert!(joins <= 1, "one batch must never issue two directory joins");
}

fuzz_target!(|ops: Vec<Op>| {
    let mut orchestrator = ConnectionOrchestrator::new();

    for op in ops {
        match op {
            Op::RequestJoin { session, spectate, restricted } => {
                let intent = ConnectionIntent::plain(
                    JoinTarget::Result(result(session, restricted)),
                    spectate,
                );
                if let Ok(actions) = orchestrator.request_join(intent) {
                    check_actions(&actions);
                }
            }
            Op::JoinFriend { friend } => {
                let actions = orchestrator.join_friend(format!("friend-{friend}"));
                check_actions(&actions);
            }
            other => {
                if let Some(event) = event_of(other) {
                    let actions = orchestrator.handle(event);
                    check_actions(&actions);
                }
            }
        }
        // The single-slot invariant holds after every step.
        assert!(orchestrator.pending_intent().iter().count() <= 1);
    }
});
