//! Application layer for Matchgate.
//!
//! Pure state machines for the server-browser UI, enabling deterministic
//! simulation testing with the same code that runs in production.
//!
//! # Components
//!
//! - [`Browser`]: the facade wiring discovery, probing, filtering, sorting,
//!   and join orchestration behind one event-driven surface.
//! - [`BrowserEvent`] / [`BrowserAction`]: the tagged unions crossing the
//!   host boundary.
//! - [`BrowserSettings`]: the persisted listing preferences.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod browser;
mod event;
mod settings;

pub use action::BrowserAction;
pub use browser::{Browser, BrowserState, StatusSummary};
pub use event::BrowserEvent;
pub use settings::BrowserSettings;
