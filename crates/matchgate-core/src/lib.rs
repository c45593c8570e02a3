//! Candidate registry and filter/sort engine for the Matchgate browser.
//!
//! Authoritative in-memory store of discovered servers and hubs, with
//! identity-based reconciliation against directory search results, and the
//! pure view pipeline (filter predicates, unresponsiveness policy, sorting)
//! that turns a listing into what the UI shows.
//!
//! Everything here is synchronous and single-writer: the registry's two
//! listings are mutated only from the host's tick thread, so no locking is
//! required.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod filter;
mod record;
mod registry;
mod sort;

pub use filter::{FilterState, UNRESPONSIVE_FLOOR_MS, best_ping, filter_hubs, filter_servers, is_unresponsive};
pub use record::{CandidateRecord, PING_UNMEASURED};
pub use registry::{CandidateRegistry, Listing};
pub use sort::{SortColumn, SortDirection, sort_hub_view, sort_server_view};
