//! Browser state machine.
//!
//! The [`Browser`] wires the candidate registry, the probe pool, and the
//! join orchestrator behind one facade, completely decoupled from I/O. It is
//! a pure state machine: it consumes [`crate::BrowserEvent`] inputs and
//! produces [`crate::BrowserAction`] instructions for the host to execute.
//!
//! # Responsibilities
//!
//! - Drives the discovery cycle: search, reconcile, sweep, probe, refilter.
//! - Owns the filtered and sorted views over both listings.
//! - Regenerates the synthetic aggregate pseudo-hub after every round.
//! - Relays join requests and session callbacks to the orchestrator.

use std::collections::HashSet;

use matchgate_client::{
    ConnectionIntent, ConnectionOrchestrator, JoinTarget, OrchestratorAction, OrchestratorEvent,
    PingConfig, PingCoordinator, ProbeAction, listing_for,
};
use matchgate_core::{
    CandidateRecord, CandidateRegistry, FilterState, Listing, SortColumn, SortDirection,
    filter_hubs, filter_servers, sort_hub_view, sort_server_view,
};
use matchgate_proto::{RawResult, SessionId};

use crate::{BrowserAction, BrowserEvent, BrowserSettings};

/// Display name of the synthetic aggregate pseudo-hub.
const AGGREGATE_HUB_NAME: &str = "All Standalone Servers";

/// High-level browser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserState {
    /// No authenticated identity session.
    NotLoggedIn,
    /// Login requested, waiting for the identity service.
    AuthInProgress,
    /// Listings are current, no round in flight.
    Idle,
    /// A discovery round is in flight (searching or probing).
    Refreshing,
}

/// Counts for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSummary {
    /// Standalone servers passing the current filters.
    pub servers_shown: usize,
    /// Standalone servers known to the registry.
    pub servers_known: usize,
    /// Hubs passing the current filters (synthetic aggregate excluded).
    pub hubs_shown: usize,
    /// Hubs known to the registry (synthetic aggregate excluded).
    pub hubs_known: usize,
    /// Probes queued or in flight.
    pub probes_outstanding: usize,
    /// Players on the servers currently shown.
    pub players_shown: u32,
    /// Players across every known standalone server.
    pub players_total: u32,
}

/// The server-browser facade.
#[derive(Debug, Clone)]
pub struct Browser {
    state: BrowserState,
    registry: CandidateRegistry,
    probes: PingCoordinator,
    orchestrator: ConnectionOrchestrator,
    filter: FilterState,
    sort_column: SortColumn,
    sort_direction: SortDirection,
    /// Filtered, sorted identity views; resolved against the registry on read.
    server_view: Vec<SessionId>,
    hub_view: Vec<SessionId>,
    /// Distinct game-mode names seen in the latest round, for the filter menu.
    game_mode_menu: Vec<String>,
    selected: Option<SessionId>,
    /// Refresh was requested before login; run one as soon as it completes.
    auto_refresh: bool,
    /// Local player's rank, for the hub rank gate.
    local_rank: u32,
    status_message: Option<String>,
}

impl Browser {
    /// Create a browser from persisted settings.
    pub fn new(settings: &BrowserSettings, local_rank: u32) -> Self {
        Self::with_probe_config(settings, local_rank, PingConfig::default())
    }

    /// Create a browser with an explicit probe-pool configuration.
    pub fn with_probe_config(
        settings: &BrowserSettings,
        local_rank: u32,
        probe_config: PingConfig,
    ) -> Self {
        Self {
            state: BrowserState::NotLoggedIn,
            registry: CandidateRegistry::new(),
            probes: PingCoordinator::new(probe_config),
            orchestrator: ConnectionOrchestrator::new(),
            filter: FilterState {
                hide_unresponsive: settings.hide_unresponsive,
                ..FilterState::default()
            },
            sort_column: settings.sort_column(),
            sort_direction: settings.sort_direction(),
            server_view: Vec::new(),
            hub_view: Vec::new(),
            game_mode_menu: Vec::new(),
            selected: None,
            auto_refresh: false,
            local_rank,
            status_message: None,
        }
    }

    /// Start a discovery round.
    ///
    /// Not logged in: a login is requested instead and the refresh runs
    /// automatically once it completes. Otherwise outstanding probes are
    /// cancelled, a consolidated refilter is requested for the round's drain,
    /// and a directory search is issued.
    pub fn refresh(&mut self) -> Vec<BrowserAction> {
        match self.state {
            BrowserState::NotLoggedIn => {
                self.auto_refresh = true;
                self.state = BrowserState::AuthInProgress;
                vec![
                    BrowserAction::Session(OrchestratorAction::Login),
                    BrowserAction::Render,
                ]
            },
            BrowserState::AuthInProgress => {
                // Login already requested; the refresh runs when it lands.
                self.auto_refresh = true;
                Vec::new()
            },
            BrowserState::Idle | BrowserState::Refreshing => {
                self.state = BrowserState::Refreshing;
                self.status_message = Some("Refreshing listings...".to_string());

                let mut actions: Vec<BrowserAction> =
                    self.probes.cancel_all().into_iter().map(BrowserAction::Probe).collect();
                self.probes.request_full_refilter();
                actions.push(BrowserAction::Search);
                actions.push(BrowserAction::Render);
                actions
            },
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: BrowserEvent) -> Vec<BrowserAction> {
        match event {
            BrowserEvent::LoginCompleted => self.on_login_completed(),
            BrowserEvent::LoginFailed { reason } => self.on_login_failed(reason),
            BrowserEvent::SearchCompleted { results } => self.on_search_completed(&results),
            BrowserEvent::SearchFailed { reason } => {
                tracing::warn!(reason, "directory search failed");
                self.state = BrowserState::Idle;
                self.status_message = Some(format!("Search failed: {reason}"));
                vec![BrowserAction::Render]
            },
            BrowserEvent::ProbeCompleted { probe, ping_ms, reply } => {
                let mut actions = Vec::new();
                if let Some(session) = self.probes.settle(probe) {
                    if let Some(record) = self.registry.get_mut(Listing::Servers, &session) {
                        record.apply_probe(ping_ms, &reply);
                    } else if let Some(record) = self.registry.get_mut(Listing::Hubs, &session) {
                        record.apply_probe(ping_ms, &reply);
                    }
                }
                self.pump_probes(&mut actions);
                actions.push(BrowserAction::Render);
                actions
            },
            BrowserEvent::ProbeFailed { probe } => {
                // The record keeps its previous latency; listing membership
                // is independent of responsiveness.
                let mut actions = Vec::new();
                if let Some(session) = self.probes.settle(probe) {
                    tracing::debug!(session = %session, "probe failed");
                }
                self.pump_probes(&mut actions);
                actions.push(BrowserAction::Render);
                actions
            },
            BrowserEvent::Session(event) => {
                let actions = self.orchestrator.handle(event);
                self.relay_session_actions(actions)
            },
        }
    }

    /// Set the free-text name filter and rebuild the views.
    pub fn set_filter_text(&mut self, text: String) -> Vec<BrowserAction> {
        self.filter.text = text;
        self.rebuild_views();
        vec![BrowserAction::Render]
    }

    /// Set the game-mode filter (`None` shows every mode) and rebuild.
    pub fn set_game_mode_filter(&mut self, game_mode: Option<String>) -> Vec<BrowserAction> {
        self.filter.game_mode = game_mode;
        self.rebuild_views();
        vec![BrowserAction::Render]
    }

    /// Toggle hiding of unresponsive records; persisted.
    pub fn set_hide_unresponsive(&mut self, hide: bool) -> Vec<BrowserAction> {
        self.filter.hide_unresponsive = hide;
        self.rebuild_views();
        vec![self.persist_settings(), BrowserAction::Render]
    }

    /// Sort the server listing by a column.
    ///
    /// Selecting the current column toggles direction; a new column starts
    /// ascending. The choice is persisted.
    pub fn sort(&mut self, column: SortColumn) -> Vec<BrowserAction> {
        if self.sort_column == column {
            self.sort_direction = self.sort_direction.toggled();
        } else {
            self.sort_column = column;
            self.sort_direction = SortDirection::Ascending;
        }
        sort_server_view(
            self.registry.records(Listing::Servers),
            &mut self.server_view,
            self.sort_column,
            self.sort_direction,
        );
        vec![self.persist_settings(), BrowserAction::Render]
    }

    /// Select a row; the selection is re-probed so its roster and rules are
    /// current when the detail pane opens.
    pub fn select(&mut self, session: SessionId) -> Vec<BrowserAction> {
        let mut actions = Vec::new();
        let target = self.record(&session).map(|r| (r.beacon_addr.clone(), r.synthetic));
        if let Some((beacon_addr, synthetic)) = target {
            if !synthetic {
                self.probes.reprobe(session.clone(), beacon_addr);
            }
            self.selected = Some(session);
            self.pump_probes(&mut actions);
        }
        actions.push(BrowserAction::Render);
        actions
    }

    /// Join the selected session, optionally as a spectator.
    pub fn join_selected(&mut self, spectate: bool) -> Vec<BrowserAction> {
        let Some(result) = self
            .selected
            .as_ref()
            .and_then(|session| self.record(session))
            .filter(|record| !record.synthetic)
            .map(result_of)
        else {
            self.status_message = Some("Nothing selected to join.".to_string());
            return vec![BrowserAction::Render];
        };

        let intent = ConnectionIntent::plain(JoinTarget::Result(result), spectate);
        match self.orchestrator.request_join(intent) {
            Ok(actions) => self.relay_session_actions(actions),
            Err(error) => {
                self.status_message = Some(error.to_string());
                vec![BrowserAction::Render]
            },
        }
    }

    /// Resolve and join a friend's current session.
    pub fn join_friend(&mut self, friend_id: String) -> Vec<BrowserAction> {
        let actions = self.orchestrator.join_friend(friend_id);
        self.relay_session_actions(actions)
    }

    /// Current browser state.
    pub fn state(&self) -> BrowserState {
        self.state
    }

    /// The filtered, sorted server view.
    pub fn server_view(&self) -> &[SessionId] {
        &self.server_view
    }

    /// The filtered, trust-then-latency sorted hub view.
    pub fn hub_view(&self) -> &[SessionId] {
        &self.hub_view
    }

    /// Resolve an identity from either listing.
    pub fn record(&self, session: &SessionId) -> Option<&CandidateRecord> {
        self.registry
            .get(Listing::Servers, session)
            .or_else(|| self.registry.get(Listing::Hubs, session))
    }

    /// Currently selected row.
    pub fn selected(&self) -> Option<&SessionId> {
        self.selected.as_ref()
    }

    /// Distinct game-mode names from the latest round, for the filter menu.
    pub fn game_mode_menu(&self) -> &[String] {
        &self.game_mode_menu
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Join state machine, for read-only inspection.
    pub fn orchestrator(&self) -> &ConnectionOrchestrator {
        &self.orchestrator
    }

    /// Counts for the status line.
    pub fn status(&self) -> StatusSummary {
        let servers = self.registry.records(Listing::Servers);
        let (players_total, _, _) = self.registry.tally_servers();
        let players_shown = self
            .server_view
            .iter()
            .filter_map(|session| servers.iter().find(|r| &r.session == session))
            .map(|r| r.players)
            .sum();
        let hubs_shown = self
            .hub_view
            .iter()
            .filter_map(|session| self.registry.get(Listing::Hubs, session))
            .filter(|r| !r.synthetic)
            .count();

        StatusSummary {
            servers_shown: self.server_view.len(),
            servers_known: self.registry.census(Listing::Servers),
            hubs_shown,
            hubs_known: self.registry.census(Listing::Hubs),
            probes_outstanding: self.probes.outstanding(),
            players_shown,
            players_total,
        }
    }

    fn on_login_completed(&mut self) -> Vec<BrowserAction> {
        if matches!(self.state, BrowserState::NotLoggedIn | BrowserState::AuthInProgress) {
            self.state = BrowserState::Idle;
        }
        let session_actions = self.orchestrator.handle(OrchestratorEvent::LoginCompleted);
        let mut actions = self.relay_session_actions(session_actions);
        if self.auto_refresh {
            self.auto_refresh = false;
            actions.extend(self.refresh());
        }
        actions
    }

    fn on_login_failed(&mut self, reason: String) -> Vec<BrowserAction> {
        self.state = BrowserState::NotLoggedIn;
        self.auto_refresh = false;
        let session_actions =
            self.orchestrator.handle(OrchestratorEvent::LoginFailed { reason: reason.clone() });
        let mut actions = self.relay_session_actions(session_actions);
        self.status_message = Some(format!("Login failed: {reason}"));
        actions.push(BrowserAction::Render);
        actions
    }

    fn on_search_completed(&mut self, results: &[RawResult]) -> Vec<BrowserAction> {
        let mut servers = Vec::new();
        let mut hubs = Vec::new();
        for result in results {
            match listing_for(result) {
                Listing::Servers => servers.push(result.clone()),
                Listing::Hubs => hubs.push(result.clone()),
            }
        }

        self.registry.reconcile(Listing::Servers, &servers);
        self.registry.reconcile(Listing::Hubs, &hubs);

        let fresh_servers: HashSet<SessionId> =
            servers.iter().map(|r| r.session.clone()).collect();
        let fresh_hubs: HashSet<SessionId> = hubs.iter().map(|r| r.session.clone()).collect();
        self.registry.sweep_stale(Listing::Servers, &fresh_servers);
        self.registry.sweep_stale(Listing::Hubs, &fresh_hubs);
        if self.selected.as_ref().is_some_and(|s| self.record(s).is_none()) {
            self.selected = None;
        }

        self.regenerate_aggregate();
        self.rebuild_game_mode_menu();

        // Every survivor gets a fresh probe; hubs jump the queue so their
        // live match data arrives first.
        for record in self.registry.records(Listing::Hubs) {
            if !record.synthetic {
                self.probes.enqueue(record.session.clone(), record.beacon_addr.clone(), true);
            }
        }
        for record in self.registry.records(Listing::Servers) {
            self.probes.enqueue(record.session.clone(), record.beacon_addr.clone(), false);
        }

        self.status_message = None;
        let mut actions = Vec::new();
        self.pump_probes(&mut actions);
        self.rebuild_views();
        actions.push(BrowserAction::Render);
        actions
    }

    /// Drain the probe queue into host actions. The coordinator's
    /// consolidated refilter is consumed here: views are rebuilt and a
    /// refresh in flight becomes idle.
    fn pump_probes(&mut self, actions: &mut Vec<BrowserAction>) {
        for action in self.probes.pump() {
            match action {
                ProbeAction::RefilterListings => {
                    self.rebuild_views();
                    if self.state == BrowserState::Refreshing {
                        self.state = BrowserState::Idle;
                    }
                },
                other => actions.push(BrowserAction::Probe(other)),
            }
        }
    }

    /// Relay orchestrator actions to the host; classified failures become the
    /// status line instead of a separate surface.
    fn relay_session_actions(&mut self, actions: Vec<OrchestratorAction>) -> Vec<BrowserAction> {
        let mut out = Vec::new();
        for action in actions {
            match action {
                OrchestratorAction::Notify { failure } => {
                    self.status_message = Some(failure.to_string());
                },
                other => out.push(BrowserAction::Session(other)),
            }
        }
        out.push(BrowserAction::Render);
        out
    }

    fn rebuild_views(&mut self) {
        let servers = self.registry.records(Listing::Servers);
        self.server_view = filter_servers(servers, &self.filter);
        sort_server_view(servers, &mut self.server_view, self.sort_column, self.sort_direction);

        let hubs = self.registry.records(Listing::Hubs);
        self.hub_view = filter_hubs(hubs, &self.filter, self.local_rank);
        sort_hub_view(hubs, &mut self.hub_view);
    }

    fn regenerate_aggregate(&mut self) {
        let (players, spectators, friends) = self.registry.tally_servers();
        let count = self.registry.census(Listing::Servers) as u32;
        self.registry.upsert_synthetic(CandidateRecord::aggregate_hub(
            AGGREGATE_HUB_NAME,
            players,
            spectators,
            friends,
            count,
        ));
    }

    fn rebuild_game_mode_menu(&mut self) {
        let mut menu: Vec<String> = self
            .registry
            .records(Listing::Servers)
            .iter()
            .map(|r| r.game_mode_name.clone())
            .collect();
        menu.sort();
        menu.dedup();
        self.game_mode_menu = menu;
    }

    fn persist_settings(&self) -> BrowserAction {
        BrowserAction::PersistSettings {
            settings: BrowserSettings::capture(
                self.sort_column,
                self.sort_direction,
                self.filter.hide_unresponsive,
            ),
        }
    }
}

/// Rebuild a directory-shaped result from a record, for join requests.
fn result_of(record: &CandidateRecord) -> RawResult {
    RawResult {
        session: record.session.clone(),
        name: record.name.clone(),
        connect_addr: record.connect_addr.clone(),
        beacon_addr: record.beacon_addr.clone(),
        game_mode_path: record.game_mode_path.clone(),
        game_mode_name: record.game_mode_name.clone(),
        map: record.map.clone(),
        players: record.players,
        spectators: record.spectators,
        max_players: record.max_players,
        max_spectators: record.max_spectators,
        match_count: record.match_count,
        min_rank: record.min_rank,
        max_rank: record.max_rank,
        version: record.version.clone(),
        flags: record.flags,
        trust: record.trust,
        is_hub: record.is_hub,
    }
}
