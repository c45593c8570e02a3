//! Fuzz target for the probe pool coordinator
//!
//! Drives arbitrary interleavings of enqueue, settle, cancel, and refilter
//! requests, including settles for stale and never-issued handles.
//!
//! # Invariants
//!
//! - Never panics on any operation ordering
//! - In-flight probes never exceed the pool limit
//! - At most one refilter is emitted per requested round
//! - A settled or cancelled handle never settles again

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use matchgate_client::{PingConfig, PingCoordinator, ProbeAction, ProbeId};
use matchgate_proto::SessionId;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Enqueue { session: u8, priority: bool },
    Pump,
    SettleIssued { index: u8 },
    CancelAll,
    RequestRefilter,
}

fuzz_target!(|input: (u8, Vec<Op>)| {
    let (limit, ops) = input;
    let pool_limit = usize::from(limit % 8) + 1;
    let mut coordinator = PingCoordinator::new(PingConfig { pool_limit });

    let mut issued: Vec<ProbeId> = Vec::new();
    let mut refilters_requested = 0_u32;
    let mut refilters_emitted = 0_u32;

    fn track(actions: &[ProbeAction], issued: &mut Vec<ProbeId>) -> u32 {
        let mut refilters = 0;
        for action in actions {
            match action {
                ProbeAction::Open { probe, .. } => issued.push(*probe),
                ProbeAction::Cancel { .. } => {}
                ProbeAction::RefilterListings => refilters += 1,
            }
        }
        refilters
    }

    for op in ops {
        match op {
            Op::Enqueue { session, priority } => {
                coordinator.enqueue(
                    SessionId::new(format!("s-{session}")),
                    "10.0.0.1:7787".to_string(),
                    priority,
                );
            }
            Op::Pump => {
                let actions = coordinator.pump();
                refilters_emitted += track(&actions, &mut issued);
            }
            Op::SettleIssued { index } => {
                if !issued.is_empty() {
                    let probe = issued[usize::from(index) % issued.len()];
                    let first = coordinator.settle(probe);
                    // A handle settles at most once.
                    if first.is_some() {
                        assert!(coordinator.settle(probe).is_none());
                    }
                }
            }
            Op::CancelAll => {
                let actions = coordinator.cancel_all();
                refilters_emitted += track(&actions, &mut issued);
                assert!(coordinator.is_drained());
            }
            Op::RequestRefilter => {
                coordinator.request_full_refilter();
                refilters_requested += 1;
            }
        }

        assert!(coordinator.inflight_len() <= pool_limit);
    }

    assert!(refilters_emitted <= refilters_requested);
});
