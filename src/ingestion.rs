//! Ingestion gateway
//!
//! Receives accounting payloads from the AAA daemon, sanitizes them and
//! dispatches to the lifecycle handler under a bounded timeout.
//!
//! Unparseable counters default to zero, unknown status types are
//! acknowledged, and failures are reported to the caller as data.

pub mod gateway;
pub mod types;

pub use gateway::IngestionGateway;
pub use types::{AccountingResponse, LegacyAccountingRequest, RadiusAccountingRequest};
