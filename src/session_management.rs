//! Session lifecycle core module.
//!
//! This module applies accounting events to the session store and reports
//! what happened as an [`EventOutcome`].
//!
//! Per (username, session id) lineage:
//! `none -> Start -> OPEN -> Interim-Update* -> OPEN -> Stop -> CLOSED`.
//! Interim-Update or Stop without an open record, and Start while one is
//! open, are logged no-ops. None of these paths is an error.

use std::fmt;

/// Submodule for inbound event records.
pub mod event;
/// Submodule for the lifecycle handler.
pub mod lifecycle;

pub use event::{non_blank, AccountingEvent};
pub use lifecycle::LifecycleHandler;

/// Acct-Status-Type of an inbound event.
///
/// Variants:
/// - `Start`: a session begins.
/// - `InterimUpdate`: periodic counter snapshot.
/// - `Stop`: a session ends with final counters.
/// - `PostAuth`: authentication notification, never stored.
/// - `Unknown`: anything else, kept verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusType {
    Start,
    InterimUpdate,
    Stop,
    PostAuth,
    Unknown(String),
}

impl StatusType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Start" => StatusType::Start,
            "Interim-Update" => StatusType::InterimUpdate,
            "Stop" => StatusType::Stop,
            "Post-Auth" => StatusType::PostAuth,
            other => StatusType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusType::Start => write!(f, "Start"),
            StatusType::InterimUpdate => write!(f, "Interim-Update"),
            StatusType::Stop => write!(f, "Stop"),
            StatusType::PostAuth => write!(f, "Post-Auth"),
            StatusType::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// What applying one event did.
///
/// Only `Failed` is a failure; every other variant is acknowledged to the
/// caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Created,
    Updated,
    Closed,
    /// Post-Auth, logged only
    Logged,
    DuplicateIgnored,
    OrphanIgnored,
    /// Unknown status type, logged only
    Unrecognized,
    Failed(String),
}

impl EventOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, EventOutcome::Failed(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventOutcome::Created => "created",
            EventOutcome::Updated => "updated",
            EventOutcome::Closed => "closed",
            EventOutcome::Logged => "logged",
            EventOutcome::DuplicateIgnored => "duplicate_ignored",
            EventOutcome::OrphanIgnored => "orphan_ignored",
            EventOutcome::Unrecognized => "unrecognized",
            EventOutcome::Failed(_) => "failed",
        }
    }
}
