//! Failure taxonomy for directory-facing operations.
//!
//! Directory-level failures always escalate to the UI boundary as a
//! classified, human-readable message; the classes below must stay
//! distinguishable there. Individual probe timeouts never appear here: they
//! are absorbed by the ping coordinator, and the candidate is simply shown
//! as unresponsive.

use thiserror::Error;

/// Classified outcome of a failed join or directory operation.
///
/// None of these are fatal: every one returns the orchestrator to an idle
/// state once surfaced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinFailure {
    /// The directory call itself failed or timed out.
    #[error("could not talk to the session directory: {reason}")]
    Directory {
        /// Transport-level description, for the log line.
        reason: String,
    },

    /// The local player already holds a session the directory knows about.
    #[error("you are already in a session and can't join another")]
    AlreadyInSession,

    /// The target session has no free slot.
    #[error("the session you are attempting to join is full")]
    SessionFull,

    /// The target session is no longer advertised.
    #[error("that match no longer exists")]
    SessionNotFound,

    /// Directory operations require an authenticated identity session.
    #[error("login required")]
    NotAuthenticated,

    /// The friend to join could not be resolved.
    #[error("couldn't find friend session to join")]
    FriendNotFound,

    /// The friend resolved but is no longer in a session.
    #[error("friend no longer in session")]
    FriendNotInSession,

    /// The target session's skill gate refuses the local player.
    #[error("your skill rating is outside what this server allows")]
    Restricted,
}

impl JoinFailure {
    /// Whether retrying the same request may succeed.
    ///
    /// Only transport-level directory failures are retryable; the classified
    /// outcomes describe a state of the world that a retry won't change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

/// Errors returned for misuse of the orchestrator API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A join was requested while one is already past the teardown phase.
    ///
    /// Joins serialize: a new attempt can only begin once the current one
    /// reaches idle. Only the teardown phase accepts an overriding intent.
    #[error("a join is already in flight (state {state})")]
    JoinInFlight {
        /// State the orchestrator was in when the request arrived.
        state: &'static str,
    },
}
