//! Browser side-effects and intents.

use matchgate_client::{OrchestratorAction, ProbeAction};

use crate::BrowserSettings;

/// Actions produced by the Browser state machine for the host to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserAction {
    /// Render the listing UI.
    Render,

    /// Start a directory search round.
    Search,

    /// A probe-pool instruction (open or cancel a beacon connection).
    Probe(ProbeAction),

    /// A session-flow instruction (directory join, teardown, travel).
    Session(OrchestratorAction),

    /// Write the user's listing preferences to the settings store.
    PersistSettings {
        /// Snapshot to persist.
        settings: BrowserSettings,
    },
}
