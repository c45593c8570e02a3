//! Scripted session directory for deterministic tests.

use std::collections::HashMap;

use matchgate_client::{JoinOutcome, JoinTarget};
use matchgate_proto::{RawResult, SessionId};

/// Result of a scripted friend lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendLookup {
    /// The friend is in a joinable session.
    Found(RawResult),
    /// The friend resolved but holds no session.
    NotInSession,
    /// The lookup itself failed.
    Failed,
}

/// A scripted stand-in for the real session directory.
///
/// Search rounds are consumed in order; the last scripted round repeats once
/// the script runs out, so steady-state tests don't need to re-push it. Join
/// outcomes default to success unless overridden per identity.
#[derive(Debug, Clone, Default)]
pub struct SimDirectory {
    rounds: Vec<Vec<RawResult>>,
    next_round: usize,
    join_outcomes: HashMap<SessionId, JoinOutcome>,
    friends: HashMap<String, FriendLookup>,
    /// Directory-registered connect strings, captured from search results.
    connect: HashMap<SessionId, String>,
    searches: usize,
}

impl SimDirectory {
    /// Create an empty directory script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one search round's results.
    pub fn push_round(&mut self, results: Vec<RawResult>) {
        for result in &results {
            self.connect.insert(result.session.clone(), result.connect_addr.clone());
        }
        self.rounds.push(results);
    }

    /// Script the join outcome for an identity.
    pub fn set_join_outcome(&mut self, session: SessionId, outcome: JoinOutcome) {
        self.join_outcomes.insert(session, outcome);
    }

    /// Script a friend lookup.
    pub fn set_friend(&mut self, friend_id: impl Into<String>, lookup: FriendLookup) {
        if let FriendLookup::Found(result) = &lookup {
            self.connect.insert(result.session.clone(), result.connect_addr.clone());
        }
        self.friends.insert(friend_id.into(), lookup);
    }

    /// Run one search round.
    pub fn search(&mut self) -> Vec<RawResult> {
        self.searches += 1;
        let round = match self.rounds.get(self.next_round) {
            Some(round) => round.clone(),
            None => self.rounds.last().cloned().unwrap_or_default(),
        };
        if self.next_round < self.rounds.len() {
            self.next_round += 1;
        }
        round
    }

    /// Attempt a join.
    pub fn join(&self, target: &JoinTarget) -> JoinOutcome {
        let session = match target {
            JoinTarget::Result(result) => &result.session,
            JoinTarget::Session(session) => session,
        };
        self.join_outcomes.get(session).cloned().unwrap_or(JoinOutcome::Success)
    }

    /// Resolve a joined target to its connect string.
    pub fn resolve(&self, target: &JoinTarget) -> Option<String> {
        match target {
            JoinTarget::Result(result) => Some(result.connect_addr.clone()),
            JoinTarget::Session(session) => self.connect.get(session).cloned(),
        }
    }

    /// Look up a friend's session.
    pub fn find_friend(&self, friend_id: &str) -> FriendLookup {
        self.friends.get(friend_id).cloned().unwrap_or(FriendLookup::Failed)
    }

    /// Number of search rounds served so far.
    pub fn searches(&self) -> usize {
        self.searches
    }
}
