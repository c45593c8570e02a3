//! Sans-IO state machines for the Matchgate discovery subsystem.
//!
//! Two machines live here, both shaped as "events in, actions out" with no
//! I/O of their own:
//!
//! - [`PingCoordinator`]: drains a FIFO queue of candidates through a
//!   bounded pool of in-flight beacon probes.
//! - [`ConnectionOrchestrator`]: the join/leave session state machine,
//!   including pending-intent coalescing, friend-session resolution, and the
//!   forced-rejoin path.
//!
//! The host event loop executes the returned actions against the real
//! session directory and beacon transport, then feeds the resulting
//! callbacks back in as events. Everything runs on one logical tick thread;
//! nothing here blocks or locks.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod directory;
mod error;
mod orchestrator;
mod ping;

pub use directory::{connect_url, listing_for};
pub use error::{JoinFailure, OrchestratorError};
pub use orchestrator::{
    ConnectionIntent, ConnectionOrchestrator, JoinOutcome, JoinTarget, OrchestratorAction,
    OrchestratorEvent, OrchestratorState,
};
pub use ping::{DEFAULT_PROBE_POOL_LIMIT, PingConfig, PingCoordinator, ProbeAction, ProbeId};
