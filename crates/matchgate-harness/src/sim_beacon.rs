//! Scripted beacon network for deterministic tests.

use std::collections::HashMap;

use matchgate_proto::BeaconReply;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Per-address beacon script.
#[derive(Debug, Clone)]
struct BeaconScript {
    latency_ms: u32,
    reply: BeaconReply,
    fail: bool,
}

/// A scripted stand-in for the beacon network.
///
/// Each address answers with a scripted latency and status payload, plus
/// optional seeded jitter so latency-sensitive tests can exercise variance
/// reproducibly. Unknown addresses fail, like a dead host.
#[derive(Debug, Clone)]
pub struct SimBeacon {
    scripts: HashMap<String, BeaconScript>,
    rng: ChaCha8Rng,
    jitter_ms: u32,
}

impl SimBeacon {
    /// Create a beacon network with the given RNG seed.
    pub fn new(seed: u64) -> Self {
        Self { scripts: HashMap::new(), rng: ChaCha8Rng::seed_from_u64(seed), jitter_ms: 0 }
    }

    /// Add `0..=jitter_ms` of seeded jitter to every answered probe.
    pub fn set_jitter(&mut self, jitter_ms: u32) {
        self.jitter_ms = jitter_ms;
    }

    /// Script an address to answer at the given latency.
    pub fn answer(&mut self, addr: impl Into<String>, latency_ms: u32, reply: BeaconReply) {
        self.scripts.insert(addr.into(), BeaconScript { latency_ms, reply, fail: false });
    }

    /// Script an address to never answer.
    pub fn silence(&mut self, addr: impl Into<String>) {
        self.scripts.insert(
            addr.into(),
            BeaconScript { latency_ms: 0, reply: BeaconReply::default(), fail: true },
        );
    }

    /// Probe an address. `None` means the probe timed out.
    pub fn probe(&mut self, addr: &str) -> Option<(u32, BeaconReply)> {
        let script = self.scripts.get(addr)?;
        if script.fail {
            return None;
        }
        let jitter = if self.jitter_ms > 0 { self.rng.gen_range(0..=self.jitter_ms) } else { 0 };
        Some((script.latency_ms + jitter, script.reply.clone()))
    }
}
