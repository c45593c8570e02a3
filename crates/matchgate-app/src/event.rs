//! Browser input events.
//!
//! The tagged union of everything that can happen to the browser: host
//! callbacks for login, discovery, and probes, plus session-flow callbacks
//! forwarded to the join orchestrator. All events are consumed on one
//! logical tick thread.

use matchgate_client::{OrchestratorEvent, ProbeId};
use matchgate_proto::{BeaconReply, RawResult};

/// Events processed by the Browser state machine.
#[derive(Debug, Clone)]
pub enum BrowserEvent {
    /// The identity session authenticated.
    LoginCompleted,

    /// Login failed or was refused.
    LoginFailed {
        /// Description for the status line.
        reason: String,
    },

    /// A directory search round finished with its full result set.
    SearchCompleted {
        /// Every session the round advertised, hubs and servers mixed.
        results: Vec<RawResult>,
    },

    /// A directory search round failed outright.
    SearchFailed {
        /// Description for the status line.
        reason: String,
    },

    /// A beacon probe answered.
    ProbeCompleted {
        /// Handle of the settled probe.
        probe: ProbeId,
        /// Measured round-trip latency.
        ping_ms: u32,
        /// The beacon's status payload.
        reply: BeaconReply,
    },

    /// A beacon probe timed out or errored.
    ///
    /// Not an error path: the candidate stays listed with its previous
    /// latency (unmeasured if it never answered).
    ProbeFailed {
        /// Handle of the settled probe.
        probe: ProbeId,
    },

    /// A session-flow callback for the join orchestrator.
    Session(OrchestratorEvent),
}
