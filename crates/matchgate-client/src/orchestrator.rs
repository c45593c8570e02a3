//! Join/leave session state machine.
//!
//! ```text
//!                 request_join (no session held)
//!   ┌──────┐ ──────────────────────────────────> ┌──────────────────────┐
//!   │ Idle │                                     │ AwaitingDirectoryJoin│
//!   └──────┘ ──> ┌─────────────────────┐  ────>  └──────────┬───────────┘
//!     ^          │ LeavingPriorSession │ teardown           │ join ok
//!     │          └─────────────────────┘ complete           v
//!     │ failure (classified, surfaced)            ┌───────────┐  resolve ┌────────────┐
//!     └───────────────────────────────────────────│ Resolving │─────────>│ Connecting │
//!                                                 └───────────┘          └────────────┘
//! ```
//!
//! A `NotLoggedIn` gate sits in front of everything: directory operations
//! require an authenticated identity session, so a join requested before
//! login is held in the single pending-intent slot and resumed when login
//! completes.
//!
//! All transitions are strictly serialized on the host's tick thread. A new
//! join can only begin once the current one reaches idle, with one
//! exception: while a prior session is being torn down, a second request
//! overwrites the stashed intent rather than queueing a second teardown.

use matchgate_proto::{RawResult, ServerFlags, SessionId};

use crate::{
    directory::connect_url,
    error::{JoinFailure, OrchestratorError},
};

/// What the user asked to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    /// A directory search result held by the browser.
    Result(RawResult),
    /// A bare session identity (forced rejoin, invite payloads).
    Session(SessionId),
}

impl JoinTarget {
    fn flags(&self) -> ServerFlags {
        match self {
            Self::Result(result) => result.flags,
            Self::Session(_) => ServerFlags::default(),
        }
    }
}

/// Parameters of one pending join, carried across the asynchronous
/// leave→join sequence.
///
/// Exactly one intent is active at a time; a second request while one is
/// stashed overwrites it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIntent {
    /// The session to join.
    pub target: JoinTarget,
    /// Connect as a spectator.
    pub spectate: bool,
    /// Desired team, if any.
    pub team: Option<u32>,
    /// Specific sub-match instance inside a hub.
    pub match_id: Option<String>,
    /// Ask the server to find a ranked match on arrival.
    pub find_ranked: bool,
    /// Quick-match category tag.
    pub quick_match: Option<String>,
    /// Friend-invite correlation id.
    pub friend_id: Option<String>,
}

impl ConnectionIntent {
    /// A plain join (or spectate) of the given target.
    pub fn plain(target: JoinTarget, spectate: bool) -> Self {
        Self {
            target,
            spectate,
            team: None,
            match_id: None,
            find_ranked: false,
            quick_match: None,
            friend_id: None,
        }
    }
}

/// Directory join outcomes, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The directory registered us in the session.
    Success,
    /// We already hold a session the directory knows about.
    AlreadyInSession,
    /// No free slot.
    SessionFull,
    /// The session is no longer advertised.
    NotFound,
    /// The call itself failed.
    Failed {
        /// Transport-level description.
        reason: String,
    },
}

/// Events fed into the orchestrator by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorEvent {
    /// The identity session authenticated.
    LoginCompleted,
    /// Login failed or was refused.
    LoginFailed {
        /// Description for the log line.
        reason: String,
    },
    /// `end_session` finished (successfully or not; teardown proceeds
    /// either way).
    EndSessionCompleted,
    /// `destroy_session` finished; the prior session is gone.
    DestroySessionCompleted,
    /// The directory answered a `join_session` call.
    JoinCompleted {
        /// Classified result.
        outcome: JoinOutcome,
    },
    /// The joined session resolved to a base connect string.
    ConnectStringResolved {
        /// Resolved `host:port` base, before query parameters.
        connect: String,
    },
    /// The joined session could not be resolved to an address.
    ConnectStringFailed,
    /// A friend lookup found the friend's current session.
    FriendSessionFound {
        /// The friend's session, ready to join.
        result: RawResult,
        /// Correlation id carried into the join URL.
        friend_id: String,
    },
    /// The friend resolved but has no joinable session.
    FriendSessionMissing,
    /// The friend lookup failed outright.
    FriendLookupFailed,
    /// Travel handed off to the local connection machinery completed.
    TravelCompleted,
    /// A server confirmed our prior session id is still authoritative;
    /// rejoin it directly.
    SessionVerified {
        /// The still-authoritative session.
        result: RawResult,
    },
}

/// Actions the orchestrator asks the host to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorAction {
    /// Start an identity login.
    Login,
    /// Ask the directory to end the currently held session.
    EndSession,
    /// Ask the directory to destroy the ended session.
    DestroySession,
    /// Ask the directory to register us in a session.
    JoinSession {
        /// The session to join.
        target: JoinTarget,
    },
    /// Resolve the joined session into a connect string.
    ResolveConnectString,
    /// Look up a friend's current session.
    FindFriendSession {
        /// Friend identity to resolve.
        friend_id: String,
    },
    /// Hand the final URL to the local travel mechanism.
    Travel {
        /// Connect URL with intent-derived query parameters.
        url: String,
    },
    /// Surface a classified failure to the user.
    Notify {
        /// The failure to present; classes must stay distinguishable.
        failure: JoinFailure,
    },
}

/// Orchestrator states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    /// No authenticated identity session; all directory work is gated.
    NotLoggedIn,
    /// Ready for a join request.
    Idle,
    /// Tearing down a previously held session before joining.
    LeavingPriorSession,
    /// `join_session` issued, waiting for the directory.
    AwaitingDirectoryJoin,
    /// Join succeeded, resolving the connect string.
    Resolving,
    /// URL handed to the travel mechanism.
    Connecting,
    /// The last join failed; behaves as idle for new requests.
    Failed(JoinFailure),
}

impl OrchestratorState {
    fn name(&self) -> &'static str {
        match self {
            Self::NotLoggedIn => "not-logged-in",
            Self::Idle => "idle",
            Self::LeavingPriorSession => "leaving-prior-session",
            Self::AwaitingDirectoryJoin => "awaiting-directory-join",
            Self::Resolving => "resolving",
            Self::Connecting => "connecting",
            Self::Failed(_) => "failed",
        }
    }
}

/// The join/leave state machine.
///
/// Pure state machine: consumes [`OrchestratorEvent`]s and request methods,
/// produces [`OrchestratorAction`]s for the host to execute.
#[derive(Debug, Clone)]
pub struct ConnectionOrchestrator {
    state: OrchestratorState,
    /// Whether the local player currently holds a directory session.
    session_held: bool,
    /// The intent currently being acted on.
    current: Option<ConnectionIntent>,
    /// The single pending-intent slot, held across login or teardown.
    pending: Option<ConnectionIntent>,
    /// A forced rejoin is in flight; its completion must not disturb an
    /// ordinary join.
    force_join_inflight: bool,
}

impl ConnectionOrchestrator {
    /// Create an orchestrator in the logged-out state.
    pub fn new() -> Self {
        Self {
            state: OrchestratorState::NotLoggedIn,
            session_held: false,
            current: None,
            pending: None,
            force_join_inflight: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Whether a directory session is currently held locally.
    pub fn session_held(&self) -> bool {
        self.session_held
    }

    /// The stashed pending intent, if any.
    pub fn pending_intent(&self) -> Option<&ConnectionIntent> {
        self.pending.as_ref()
    }

    /// Request a join.
    ///
    /// - Restricted targets are refused locally without a directory call,
    ///   in any state that would accept the intent. While a join is in
    ///   flight the request is rejected as
    ///   [`OrchestratorError::JoinInFlight`] before the flag is consulted,
    ///   so a refusal can never interrupt an ongoing join.
    /// - Not logged in: the intent is stashed and a login requested; it
    ///   resumes automatically on [`OrchestratorEvent::LoginCompleted`].
    /// - A session is held: teardown starts and the intent is stashed; a
    ///   second request during teardown overwrites the stash.
    /// - Otherwise the directory join is issued immediately.
    pub fn request_join(
        &mut self,
        intent: ConnectionIntent,
    ) -> Result<Vec<OrchestratorAction>, OrchestratorError> {
        match self.state {
            OrchestratorState::NotLoggedIn => {
                if Self::is_restricted(&intent) {
                    return Ok(self.refuse_restricted(false));
                }
                self.pending = Some(intent);
                Ok(vec![OrchestratorAction::Login])
            },
            OrchestratorState::LeavingPriorSession => {
                if Self::is_restricted(&intent) {
                    // The refused request does not clobber a valid stash.
                    return Ok(self.refuse_restricted(false));
                }
                // Coalesce: the latest request wins, no second teardown.
                tracing::debug!("join requested mid-teardown, overwriting pending intent");
                self.pending = Some(intent);
                Ok(Vec::new())
            },
            OrchestratorState::Idle | OrchestratorState::Failed(_) => {
                if Self::is_restricted(&intent) {
                    return Ok(self.refuse_restricted(true));
                }
                if self.session_held {
                    tracing::info!("already in a session, deferring join while it is torn down");
                    self.pending = Some(intent);
                    self.state = OrchestratorState::LeavingPriorSession;
                    Ok(vec![OrchestratorAction::EndSession])
                } else {
                    Ok(self.begin_join(intent))
                }
            },
            OrchestratorState::AwaitingDirectoryJoin
            | OrchestratorState::Resolving
            | OrchestratorState::Connecting => {
                Err(OrchestratorError::JoinInFlight { state: self.state.name() })
            },
        }
    }

    fn is_restricted(intent: &ConnectionIntent) -> bool {
        intent.target.flags().contains(ServerFlags::RESTRICTED)
    }

    /// Local refusal of a restricted target. Only an idle-like state records
    /// the failure; a refusal before login or mid-teardown leaves the
    /// machine where it was.
    fn refuse_restricted(&mut self, mark_failed: bool) -> Vec<OrchestratorAction> {
        let failure = JoinFailure::Restricted;
        if mark_failed {
            self.state = OrchestratorState::Failed(failure.clone());
        }
        vec![OrchestratorAction::Notify { failure }]
    }

    /// Resolve and join a friend's current session.
    ///
    /// Two-step lookup layered in front of [`Self::request_join`]: resolve
    /// the friend, find their session, then join it with the friend id as
    /// correlation parameter. Either step failing is reported distinctly and
    /// never silently retried.
    pub fn join_friend(&mut self, friend_id: String) -> Vec<OrchestratorAction> {
        tracing::info!(friend = %friend_id, "resolving friend session");
        vec![OrchestratorAction::FindFriendSession { friend_id }]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: OrchestratorEvent) -> Vec<OrchestratorAction> {
        match event {
            OrchestratorEvent::LoginCompleted => self.on_login_completed(),
            OrchestratorEvent::LoginFailed { reason } => self.on_login_failed(&reason),
            OrchestratorEvent::EndSessionCompleted => {
                // Ended; the record itself still needs destroying.
                vec![OrchestratorAction::DestroySession]
            },
            OrchestratorEvent::DestroySessionCompleted => self.on_teardown_completed(),
            OrchestratorEvent::JoinCompleted { outcome } => self.on_join_completed(outcome),
            OrchestratorEvent::ConnectStringResolved { connect } => self.on_resolved(&connect),
            OrchestratorEvent::ConnectStringFailed => self.fail(JoinFailure::Directory {
                reason: "joined session did not resolve to an address".to_string(),
            }),
            OrchestratorEvent::FriendSessionFound { result, friend_id } => {
                let mut intent =
                    ConnectionIntent::plain(JoinTarget::Result(result), false);
                intent.friend_id = Some(friend_id);
                match self.request_join(intent) {
                    Ok(actions) => actions,
                    Err(error) => {
                        tracing::warn!(%error, "friend session found while a join was in flight");
                        Vec::new()
                    },
                }
            },
            OrchestratorEvent::FriendSessionMissing => {
                vec![OrchestratorAction::Notify { failure: JoinFailure::FriendNotInSession }]
            },
            OrchestratorEvent::FriendLookupFailed => {
                vec![OrchestratorAction::Notify { failure: JoinFailure::FriendNotFound }]
            },
            OrchestratorEvent::TravelCompleted => self.on_travel_completed(),
            OrchestratorEvent::SessionVerified { result } => self.on_session_verified(result),
        }
    }

    fn begin_join(&mut self, intent: ConnectionIntent) -> Vec<OrchestratorAction> {
        tracing::info!(state = self.state.name(), "issuing directory join");
        let target = intent.target.clone();
        self.current = Some(intent);
        self.state = OrchestratorState::AwaitingDirectoryJoin;
        vec![OrchestratorAction::JoinSession { target }]
    }

    fn on_login_completed(&mut self) -> Vec<OrchestratorAction> {
        if matches!(self.state, OrchestratorState::NotLoggedIn) {
            self.state = OrchestratorState::Idle;
        }
        match self.pending.take() {
            Some(intent) if self.session_held => {
                self.pending = Some(intent);
                self.state = OrchestratorState::LeavingPriorSession;
                vec![OrchestratorAction::EndSession]
            },
            Some(intent) => self.begin_join(intent),
            None => Vec::new(),
        }
    }

    fn on_login_failed(&mut self, reason: &str) -> Vec<OrchestratorAction> {
        tracing::warn!(reason, "login failed");
        self.state = OrchestratorState::NotLoggedIn;
        self.pending = None;
        vec![OrchestratorAction::Notify { failure: JoinFailure::NotAuthenticated }]
    }

    fn on_teardown_completed(&mut self) -> Vec<OrchestratorAction> {
        self.session_held = false;
        match self.pending.take() {
            Some(intent) => self.begin_join(intent),
            None => {
                self.state = OrchestratorState::Idle;
                Vec::new()
            },
        }
    }

    fn on_join_completed(&mut self, outcome: JoinOutcome) -> Vec<OrchestratorAction> {
        // A forced rejoin's completion is consumed here without touching the
        // ordinary join bookkeeping.
        if self.force_join_inflight {
            self.force_join_inflight = false;
            if matches!(outcome, JoinOutcome::Success) {
                self.session_held = true;
            }
            return Vec::new();
        }

        match outcome {
            JoinOutcome::Success => {
                self.state = OrchestratorState::Resolving;
                vec![OrchestratorAction::ResolveConnectString]
            },
            JoinOutcome::AlreadyInSession => self.fail(JoinFailure::AlreadyInSession),
            JoinOutcome::SessionFull => self.fail(JoinFailure::SessionFull),
            JoinOutcome::NotFound => self.fail(JoinFailure::SessionNotFound),
            JoinOutcome::Failed { reason } => self.fail(JoinFailure::Directory { reason }),
        }
    }

    fn on_resolved(&mut self, connect: &str) -> Vec<OrchestratorAction> {
        let Some(intent) = self.current.as_ref() else {
            // A stray resolution with no join in flight; nothing to travel to.
            tracing::warn!("connect string resolved with no active intent");
            self.state = OrchestratorState::Idle;
            return Vec::new();
        };

        let url = connect_url(connect, intent);
        self.state = OrchestratorState::Connecting;
        self.session_held = true;
        tracing::info!(%url, "travelling to session");
        vec![OrchestratorAction::Travel { url }]
    }

    fn on_travel_completed(&mut self) -> Vec<OrchestratorAction> {
        self.current = None;
        self.state = OrchestratorState::Idle;
        Vec::new()
    }

    fn on_session_verified(&mut self, result: RawResult) -> Vec<OrchestratorAction> {
        // Direct join bypassing the pending-intent bookkeeping: the server
        // told us our prior session id is still authoritative.
        self.force_join_inflight = true;
        vec![OrchestratorAction::JoinSession { target: JoinTarget::Result(result) }]
    }

    fn fail(&mut self, failure: JoinFailure) -> Vec<OrchestratorAction> {
        tracing::warn!(%failure, "join failed");
        self.current = None;
        self.pending = None;
        self.state = OrchestratorState::Failed(failure.clone());
        vec![OrchestratorAction::Notify { failure }]
    }
}

impl Default for ConnectionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
