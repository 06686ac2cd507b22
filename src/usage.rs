//! Usage reporting
//!
//! Read-side aggregation over the session store: active sessions, per-user
//! and global bandwidth, daily series and top consumers.
//!
//! Counters are cumulative NAS values, overwritten on every update, so all
//! byte totals sum the latest reported value of each session. Null counters
//! count as zero.

pub mod aggregator;
pub mod types;

pub use aggregator::{UsageAggregator, MAX_REPORT_DAYS};
pub use types::{DailyUsage, GlobalUsage, SessionSummary, TopUser, UserUsage};
