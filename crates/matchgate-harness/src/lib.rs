//! Deterministic simulation harness for the Matchgate browser.
//!
//! Scripted stand-ins for the session directory and the beacon network, plus
//! a scenario runner that executes browser actions against them and feeds
//! the callbacks back in until quiescence. Everything is synchronous and
//! seeded, so every test run is reproducible.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod scenario;
pub mod sim_beacon;
pub mod sim_directory;

pub use scenario::Scenario;
pub use sim_beacon::SimBeacon;
pub use sim_directory::{FriendLookup, SimDirectory};
