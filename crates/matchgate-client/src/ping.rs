//! Bounded concurrent beacon probing.
//!
//! The coordinator drains a FIFO queue of candidates through a pool of at
//! most `pool_limit` in-flight probes. The bound exists to avoid saturating
//! the local network stack with simultaneous ephemeral probe connections.
//!
//! Completion and failure both free a slot and re-pump; listing membership
//! is the caller's concern and is independent of whether the probe answered.
//! When both the queue and the pool are empty and a full refilter was
//! requested, the coordinator signals one consolidated refilter. If a
//! second discovery round starts before the first drains, the request is
//! carried forward and a single refilter runs at the final drain.

use std::collections::VecDeque;

use matchgate_proto::SessionId;

/// Default bound on simultaneous in-flight probes.
pub const DEFAULT_PROBE_POOL_LIMIT: usize = 30;

/// Probe pool configuration.
#[derive(Debug, Clone)]
pub struct PingConfig {
    /// Maximum simultaneous in-flight probes.
    pub pool_limit: usize,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self { pool_limit: DEFAULT_PROBE_POOL_LIMIT }
    }
}

/// Opaque handle correlating a dispatched probe with its transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeId(u64);

/// Actions the coordinator asks the host to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAction {
    /// Open a beacon connection and send the status request.
    Open {
        /// Handle to report completion or failure against.
        probe: ProbeId,
        /// Candidate being probed.
        session: SessionId,
        /// Beacon address to connect to.
        beacon_addr: String,
    },

    /// Forcibly close an in-flight probe's transport.
    Cancel {
        /// Handle of the probe to terminate.
        probe: ProbeId,
    },

    /// Both queue and pool drained with a full refilter outstanding: rebuild
    /// both listings' views with the now-final latencies.
    RefilterListings,
}

#[derive(Debug, Clone)]
struct QueuedProbe {
    session: SessionId,
    beacon_addr: String,
}

#[derive(Debug, Clone)]
struct InflightProbe {
    probe: ProbeId,
    session: SessionId,
}

/// FIFO probe queue drained through a bounded in-flight pool.
#[derive(Debug, Clone)]
pub struct PingCoordinator {
    config: PingConfig,
    pending: VecDeque<QueuedProbe>,
    inflight: Vec<InflightProbe>,
    next_probe: u64,
    wants_full_refilter: bool,
}

impl PingCoordinator {
    /// Create a coordinator with the given pool bound.
    pub fn new(config: PingConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
            inflight: Vec::new(),
            next_probe: 0,
            wants_full_refilter: false,
        }
    }

    /// Request one consolidated refilter at the next full drain.
    ///
    /// Set when a discovery round starts; consumed only when the pool fully
    /// drains, so overlapping rounds coalesce into a single refilter.
    pub fn request_full_refilter(&mut self) {
        self.wants_full_refilter = true;
    }

    /// Queue a candidate for probing.
    ///
    /// Hubs are queued at the front (`priority`) so their live match data
    /// arrives first. A candidate already queued or in flight is not
    /// duplicated; order affects probe priority only.
    pub fn enqueue(&mut self, session: SessionId, beacon_addr: String, priority: bool) {
        if self.is_tracked(&session) {
            return;
        }
        let queued = QueuedProbe { session, beacon_addr };
        if priority {
            self.pending.push_front(queued);
        } else {
            self.pending.push_back(queued);
        }
    }

    /// Queue a re-probe for an already-known record, e.g. when the user
    /// selects a row to refresh its roster. Skipped if a probe for the same
    /// identity is already outstanding.
    pub fn reprobe(&mut self, session: SessionId, beacon_addr: String) {
        self.enqueue(session, beacon_addr, true);
    }

    /// Dispatch queued probes while the pool has capacity.
    ///
    /// Called after enqueueing and after every completion or failure. When
    /// everything has drained and a full refilter is outstanding, the single
    /// [`ProbeAction::RefilterListings`] is emitted and the request cleared.
    pub fn pump(&mut self) -> Vec<ProbeAction> {
        let mut actions = Vec::new();

        if self.pending.is_empty() && self.inflight.is_empty() {
            if self.wants_full_refilter {
                actions.push(ProbeAction::RefilterListings);
            }
            self.wants_full_refilter = false;
            return actions;
        }

        while self.inflight.len() < self.config.pool_limit {
            let Some(queued) = self.pending.pop_front() else {
                break;
            };
            let probe = ProbeId(self.next_probe);
            self.next_probe += 1;

            tracing::debug!(session = %queued.session, probe = probe.0, "dispatching probe");
            self.inflight.push(InflightProbe { probe, session: queued.session.clone() });
            actions.push(ProbeAction::Open {
                probe,
                session: queued.session,
                beacon_addr: queued.beacon_addr,
            });
        }

        actions
    }

    /// Settle an in-flight probe (successful or failed), freeing its slot.
    ///
    /// Returns the candidate the probe belonged to so the caller can apply
    /// or record the outcome. `None` for handles this coordinator no longer
    /// tracks: a late callback from a cancelled round is ignored rather
    /// than mixed into the current one.
    pub fn settle(&mut self, probe: ProbeId) -> Option<SessionId> {
        let index = self.inflight.iter().position(|p| p.probe == probe)?;
        Some(self.inflight.swap_remove(index).session)
    }

    /// Cancel everything before a new discovery round.
    ///
    /// Pending probes are dropped; in-flight ones get a
    /// [`ProbeAction::Cancel`] each so the host closes their transports.
    pub fn cancel_all(&mut self) -> Vec<ProbeAction> {
        self.pending.clear();
        self.inflight.drain(..).map(|p| ProbeAction::Cancel { probe: p.probe }).collect()
    }

    /// Number of queued probes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of in-flight probes.
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    /// Probes not yet settled, queued or in flight.
    pub fn outstanding(&self) -> usize {
        self.pending.len() + self.inflight.len()
    }

    /// Whether nothing is queued or in flight.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.inflight.is_empty()
    }

    fn is_tracked(&self, session: &SessionId) -> bool {
        self.pending.iter().any(|p| &p.session == session)
            || self.inflight.iter().any(|p| &p.session == session)
    }
}

impl Default for PingCoordinator {
    fn default() -> Self {
        Self::new(PingConfig::default())
    }
}
