//! Authoritative store for the two candidate listings.
//!
//! Records are merged by directory-assigned identity and updated in place,
//! so references held by the view layer stay meaningful across refresh
//! cycles. A directory round ends with a staleness sweep that drops every
//! non-synthetic identity the round no longer advertised.

use std::collections::HashSet;

use matchgate_proto::{RawResult, SessionId};

use crate::record::CandidateRecord;

/// The two logically distinct listing classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    /// Standalone game servers.
    Servers,
    /// Persistent hub sessions (and the synthetic aggregate).
    Hubs,
}

/// In-memory store of all known candidates, one listing per class.
#[derive(Debug, Default, Clone)]
pub struct CandidateRegistry {
    servers: Vec<CandidateRecord>,
    hubs: Vec<CandidateRecord>,
}

impl CandidateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in a listing, in insertion order.
    pub fn records(&self, listing: Listing) -> &[CandidateRecord] {
        match listing {
            Listing::Servers => &self.servers,
            Listing::Hubs => &self.hubs,
        }
    }

    fn records_mut(&mut self, listing: Listing) -> &mut Vec<CandidateRecord> {
        match listing {
            Listing::Servers => &mut self.servers,
            Listing::Hubs => &mut self.hubs,
        }
    }

    /// Look up a record by identity.
    pub fn get(&self, listing: Listing, session: &SessionId) -> Option<&CandidateRecord> {
        self.records(listing).iter().find(|r| &r.session == session)
    }

    /// Look up a record by identity, mutably.
    pub fn get_mut(
        &mut self,
        listing: Listing,
        session: &SessionId,
    ) -> Option<&mut CandidateRecord> {
        self.records_mut(listing).iter_mut().find(|r| &r.session == session)
    }

    /// Reconcile a batch of directory results against a listing.
    ///
    /// Unknown identities are inserted; known ones are merged in place. A
    /// result whose identity appears twice in the batch coalesces into the
    /// same record, last write winning on the mutable fields. Directories
    /// are eventually consistent and never a source of hard errors.
    ///
    /// Every survivor is re-probed each round anyway (latencies go stale
    /// between rounds), so nothing here reports which records changed.
    pub fn reconcile(&mut self, listing: Listing, results: &[RawResult]) {
        for result in results {
            match self.get_mut(listing, &result.session) {
                Some(existing) => existing.merge_result(result),
                None => {
                    self.records_mut(listing).push(CandidateRecord::from_result(result));
                },
            }
        }

        tracing::debug!(
            listing = ?listing,
            results = results.len(),
            "reconciled directory results"
        );
    }

    /// Drop every record whose identity a full directory round no longer
    /// reported. Synthetic aggregates are exempt: they are regenerated, not
    /// swept.
    pub fn sweep_stale(&mut self, listing: Listing, fresh: &HashSet<SessionId>) {
        let before = self.records(listing).len();
        self.records_mut(listing).retain(|r| r.synthetic || fresh.contains(&r.session));
        let dropped = before - self.records(listing).len();
        if dropped > 0 {
            tracing::debug!(listing = ?listing, dropped, "swept stale records");
        }
    }

    /// Insert or replace a synthetic record in the hub listing.
    pub fn upsert_synthetic(&mut self, record: CandidateRecord) {
        debug_assert!(record.synthetic);
        self.hubs.retain(|r| r.session != record.session);
        self.hubs.push(record);
    }

    /// Summed `(players, spectators, friends)` across the server listing,
    /// feeding the synthetic aggregate hub.
    pub fn tally_servers(&self) -> (u32, u32, u32) {
        self.servers.iter().fold((0, 0, 0), |(p, s, f), r| {
            (p + r.players, s + r.spectators, f + r.friends)
        })
    }

    /// Number of non-synthetic records in a listing.
    pub fn census(&self, listing: Listing) -> usize {
        self.records(listing).iter().filter(|r| !r.synthetic).count()
    }
}
