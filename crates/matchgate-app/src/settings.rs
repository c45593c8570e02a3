//! Persisted listing preferences.
//!
//! The host owns the actual settings store; the browser hands it a
//! serializable snapshot whenever a preference changes and receives one back
//! at startup. Decoding is lenient: a stale or hand-edited entry falls back
//! to the defaults instead of wedging the browser.

use matchgate_core::{SortColumn, SortDirection};
use serde::{Deserialize, Serialize};

/// Snapshot of the user's listing preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Persisted name of the server-listing sort column.
    pub sort_column: String,
    /// Whether the sort runs largest-first.
    pub sort_descending: bool,
    /// Whether unresponsive records are hidden.
    pub hide_unresponsive: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            sort_column: SortColumn::Ping.as_str().to_string(),
            sort_descending: false,
            hide_unresponsive: true,
        }
    }
}

impl BrowserSettings {
    /// Snapshot the browser's current preferences.
    pub fn capture(
        column: SortColumn,
        direction: SortDirection,
        hide_unresponsive: bool,
    ) -> Self {
        Self {
            sort_column: column.as_str().to_string(),
            sort_descending: direction == SortDirection::Descending,
            hide_unresponsive,
        }
    }

    /// The persisted sort column; unknown names fall back to ping.
    pub fn sort_column(&self) -> SortColumn {
        SortColumn::from_persisted(&self.sort_column).unwrap_or(SortColumn::Ping)
    }

    /// The persisted sort direction.
    pub fn sort_direction(&self) -> SortDirection {
        if self.sort_descending { SortDirection::Descending } else { SortDirection::Ascending }
    }
}
