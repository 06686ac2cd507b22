//! Helpers for building `SessionFilter` values.

use chrono::{DateTime, Utc};

pub use crate::storage::types::SessionFilter;

pub fn open_sessions() -> SessionFilter {
    SessionFilter {
        open_only: true,
        ..Default::default()
    }
}

pub fn by_username<S: Into<String>>(username: S, open_only: bool) -> SessionFilter {
    SessionFilter {
        username: Some(username.into()),
        open_only,
        ..Default::default()
    }
}

/// Records started at or after `since`, plus every still-open record.
pub fn usage_window(username: Option<String>, since: DateTime<Utc>) -> SessionFilter {
    SessionFilter {
        username,
        window_since: Some(since),
        ..Default::default()
    }
}

pub fn overlapping(from: DateTime<Utc>, to: DateTime<Utc>) -> SessionFilter {
    SessionFilter {
        overlapping: Some((from, to)),
        ..Default::default()
    }
}
