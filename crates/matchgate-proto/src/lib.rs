//! Data contracts for the Matchgate discovery subsystem.
//!
//! Two external collaborators feed this system:
//!
//! - The **session directory**: advertises sessions as [`RawResult`] entries
//!   keyed by a stable [`SessionId`].
//! - The **beacon transport**: answers per-candidate status probes with a
//!   [`BeaconReply`] carrying live roster/rules text blobs.
//!
//! This crate owns no wire format. It defines the in-memory shapes both sides
//! agree on and the lenient parsers for the beacon's flat text blobs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod beacon;
mod session;

pub use beacon::{BeaconReply, InstanceSummary, RosterEntry, RuleEntry, parse_roster, parse_rules};
pub use session::{RawResult, ServerFlags, SessionId, TrustTier};
