//! Scenario runner driving a [`Browser`] against the scripted services.
//!
//! Actions the browser emits are executed against [`SimDirectory`] and
//! [`SimBeacon`] immediately, and the resulting callbacks are fed back in as
//! events until the system reaches quiescence. Everything is synchronous and
//! seeded, so a failing scenario replays identically.

use std::collections::VecDeque;

use matchgate_app::{Browser, BrowserAction, BrowserEvent, BrowserSettings};
use matchgate_client::{
    JoinTarget, OrchestratorAction, OrchestratorEvent, PingConfig, ProbeAction,
};
use matchgate_proto::SessionId;

use crate::{FriendLookup, SimBeacon, SimDirectory};

/// Upper bound on action-execution steps per run, against runaway loops.
const STEP_LIMIT: usize = 10_000;

/// A browser wired to scripted services.
pub struct Scenario {
    browser: Browser,
    directory: SimDirectory,
    beacon: SimBeacon,
    queue: VecDeque<BrowserAction>,
    /// Target of the last directory join, for connect-string resolution.
    joining: Option<JoinTarget>,
    /// Every URL handed to the travel mechanism, in order.
    travelled: Vec<String>,
    /// Last settings snapshot the browser asked to persist.
    persisted: Option<BrowserSettings>,
    renders: usize,
}

impl Scenario {
    /// Wire a browser with default settings to the scripted services.
    pub fn new(directory: SimDirectory, beacon: SimBeacon) -> Self {
        Self::with_settings(directory, beacon, BrowserSettings::default(), 1500)
    }

    /// Wire a browser with explicit settings and local rank.
    pub fn with_settings(
        directory: SimDirectory,
        beacon: SimBeacon,
        settings: BrowserSettings,
        local_rank: u32,
    ) -> Self {
        let browser = Browser::with_probe_config(&settings, local_rank, PingConfig::default());
        Self {
            browser,
            directory,
            beacon,
            queue: VecDeque::new(),
            joining: None,
            travelled: Vec::new(),
            persisted: None,
            renders: 0,
        }
    }

    /// The browser under test.
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// The browser under test, mutably (for filter and sort calls whose
    /// actions don't need executing).
    pub fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// URLs handed to the travel mechanism, in order.
    pub fn travelled(&self) -> &[String] {
        &self.travelled
    }

    /// Last settings snapshot the browser asked to persist.
    pub fn persisted(&self) -> Option<&BrowserSettings> {
        self.persisted.as_ref()
    }

    /// Renders requested so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Scripted directory, for mid-scenario re-scripting.
    pub fn directory_mut(&mut self) -> &mut SimDirectory {
        &mut self.directory
    }

    /// Refresh the listings and run to quiescence.
    pub fn refresh(&mut self) {
        let actions = self.browser.refresh();
        self.dispatch(actions);
        self.run();
    }

    /// Select a row and run to quiescence.
    pub fn select(&mut self, session: SessionId) {
        let actions = self.browser.select(session);
        self.dispatch(actions);
        self.run();
    }

    /// Join the selected session and run to quiescence.
    pub fn join_selected(&mut self, spectate: bool) {
        let actions = self.browser.join_selected(spectate);
        self.dispatch(actions);
        self.run();
    }

    /// Resolve and join a friend's session, running to quiescence.
    pub fn join_friend(&mut self, friend_id: &str) {
        let actions = self.browser.join_friend(friend_id.to_string());
        self.dispatch(actions);
        self.run();
    }

    /// Queue actions for execution.
    pub fn dispatch(&mut self, actions: Vec<BrowserAction>) {
        self.queue.extend(actions);
    }

    /// Execute queued actions, feeding callbacks back in, until quiescent.
    pub fn run(&mut self) {
        let mut steps = 0;
        while let Some(action) = self.queue.pop_front() {
            steps += 1;
            assert!(steps <= STEP_LIMIT, "scenario did not reach quiescence");

            if let Some(event) = self.execute(action) {
                let actions = self.browser.handle(event);
                self.queue.extend(actions);
            }
        }
    }

    /// Execute one action against the scripted services; the returned event
    /// is the service's callback.
    fn execute(&mut self, action: BrowserAction) -> Option<BrowserEvent> {
        match action {
            BrowserAction::Render => {
                self.renders += 1;
                None
            },
            BrowserAction::Search => {
                let results = self.directory.search();
                tracing::debug!(results = results.len(), "serving scripted search round");
                Some(BrowserEvent::SearchCompleted { results })
            },
            BrowserAction::Probe(ProbeAction::Open { probe, beacon_addr, .. }) => {
                match self.beacon.probe(&beacon_addr) {
                    Some((ping_ms, reply)) => {
                        Some(BrowserEvent::ProbeCompleted { probe, ping_ms, reply })
                    },
                    None => Some(BrowserEvent::ProbeFailed { probe }),
                }
            },
            BrowserAction::Probe(ProbeAction::Cancel { .. }) => None,
            BrowserAction::Probe(ProbeAction::RefilterListings) => {
                // Consumed inside the browser; never crosses the boundary.
                unreachable!("refilter is internal to the browser")
            },
            BrowserAction::Session(action) => self.execute_session(action),
            BrowserAction::PersistSettings { settings } => {
                self.persisted = Some(settings);
                None
            },
        }
    }

    fn execute_session(&mut self, action: OrchestratorAction) -> Option<BrowserEvent> {
        match action {
            OrchestratorAction::Login => Some(BrowserEvent::LoginCompleted),
            OrchestratorAction::EndSession => {
                Some(BrowserEvent::Session(OrchestratorEvent::EndSessionCompleted))
            },
            OrchestratorAction::DestroySession => {
                Some(BrowserEvent::Session(OrchestratorEvent::DestroySessionCompleted))
            },
            OrchestratorAction::JoinSession { target } => {
                let outcome = self.directory.join(&target);
                self.joining = Some(target);
                Some(BrowserEvent::Session(OrchestratorEvent::JoinCompleted { outcome }))
            },
            OrchestratorAction::ResolveConnectString => {
                let connect =
                    self.joining.as_ref().and_then(|target| self.directory.resolve(target));
                match connect {
                    Some(connect) => Some(BrowserEvent::Session(
                        OrchestratorEvent::ConnectStringResolved { connect },
                    )),
                    None => Some(BrowserEvent::Session(OrchestratorEvent::ConnectStringFailed)),
                }
            },
            OrchestratorAction::FindFriendSession { friend_id } => {
                match self.directory.find_friend(&friend_id) {
                    FriendLookup::Found(result) => Some(BrowserEvent::Session(
                        OrchestratorEvent::FriendSessionFound { result, friend_id },
                    )),
                    FriendLookup::NotInSession => {
                        Some(BrowserEvent::Session(OrchestratorEvent::FriendSessionMissing))
                    },
                    FriendLookup::Failed => {
                        Some(BrowserEvent::Session(OrchestratorEvent::FriendLookupFailed))
                    },
                }
            },
            OrchestratorAction::Travel { url } => {
                tracing::debug!(%url, "travelling");
                self.travelled.push(url);
                Some(BrowserEvent::Session(OrchestratorEvent::TravelCompleted))
            },
            OrchestratorAction::Notify { .. } => {
                // The browser folds failures into its status line; a notify
                // reaching the harness is a wiring bug.
                unreachable!("notifications are consumed by the browser")
            },
        }
    }
}
