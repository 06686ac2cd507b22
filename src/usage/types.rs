use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::storage::types::SessionRecord;

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn octets_to_mb(octets: u64) -> f64 {
    round_to(octets as f64 / MIB, 2)
}

pub fn octets_to_gb(octets: u64) -> f64 {
    round_to(octets as f64 / GIB, 2)
}

pub fn seconds_to_hours(seconds: i64) -> f64 {
    round_to(seconds as f64 / 3600.0, 1)
}

/// Running sums over a set of session records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    pub download_octets: u64,
    pub upload_octets: u64,
    pub time_seconds: i64,
    pub session_count: u64,
}

impl UsageTotals {
    pub fn add(&mut self, record: &SessionRecord, now: DateTime<Utc>) {
        self.download_octets = self.download_octets.saturating_add(record.input());
        self.upload_octets = self.upload_octets.saturating_add(record.output());
        self.time_seconds = self
            .time_seconds
            .saturating_add(record.duration_seconds(now));
        self.session_count += 1;
    }

    pub fn total_octets(&self) -> u64 {
        self.download_octets.saturating_add(self.upload_octets)
    }

    pub fn collect<'a, I>(records: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a SessionRecord>,
    {
        let mut totals = Self::default();
        for record in records {
            totals.add(record, now);
        }
        totals
    }
}

/// One row of the active/user session listings.
///
/// `duration_seconds` is the elapsed time for open sessions and the
/// effective duration for closed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub username: String,
    pub session_id: String,
    pub unique_id: String,
    pub nas_ip_address: String,
    pub calling_station_id: Option<String>,
    pub framed_ip_address: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub input_octets: u64,
    pub output_octets: u64,
    pub total_octets: u64,
    pub total_mb: f64,
}

impl SessionSummary {
    pub fn from_record(record: &SessionRecord, now: DateTime<Utc>) -> Self {
        let duration_seconds = if record.is_active() {
            record.elapsed_seconds(now)
        } else {
            record.duration_seconds(now)
        };
        Self {
            username: record.username.clone(),
            session_id: record.session_id.clone(),
            unique_id: record.unique_id.clone(),
            nas_ip_address: record.nas_address.clone(),
            calling_station_id: record.calling_station_id.clone(),
            framed_ip_address: record.framed_ip_address.clone(),
            start_time: record.start_time,
            stop_time: record.stop_time,
            duration_seconds,
            input_octets: record.input(),
            output_octets: record.output(),
            total_octets: record.total_octets(),
            total_mb: octets_to_mb(record.total_octets()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserUsage {
    pub username: String,
    pub period_days: u32,
    pub download_octets: u64,
    pub upload_octets: u64,
    pub total_octets: u64,
    pub download_mb: f64,
    pub upload_mb: f64,
    pub total_mb: f64,
    pub total_gb: f64,
    pub total_time_seconds: i64,
    pub total_time_hours: f64,
    pub session_count: u64,
}

impl UserUsage {
    pub fn new(username: &str, period_days: u32, totals: &UsageTotals) -> Self {
        Self {
            username: username.to_string(),
            period_days,
            download_octets: totals.download_octets,
            upload_octets: totals.upload_octets,
            total_octets: totals.total_octets(),
            download_mb: octets_to_mb(totals.download_octets),
            upload_mb: octets_to_mb(totals.upload_octets),
            total_mb: octets_to_mb(totals.total_octets()),
            total_gb: octets_to_gb(totals.total_octets()),
            total_time_seconds: totals.time_seconds,
            total_time_hours: seconds_to_hours(totals.time_seconds),
            session_count: totals.session_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalUsage {
    pub period_days: u32,
    pub download_octets: u64,
    pub upload_octets: u64,
    pub total_octets: u64,
    pub download_mb: f64,
    pub upload_mb: f64,
    pub total_mb: f64,
    pub total_gb: f64,
    pub total_time_hours: f64,
    pub session_count: u64,
    /// Distinct usernames with an open session
    pub active_users_count: u64,
    /// Distinct usernames known to the credentials store
    pub total_users_count: u64,
    pub timestamp: DateTime<Utc>,
}

/// Usage of one UTC calendar day.
///
/// Octets are the cumulative counters of every session overlapping the day,
/// so a session spanning midnight is counted on both days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyUsage {
    pub date: String,
    pub download_octets: u64,
    pub upload_octets: u64,
    pub total_octets: u64,
    pub download_mb: f64,
    pub upload_mb: f64,
    pub total_mb: f64,
    pub session_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopUser {
    pub username: String,
    pub download_octets: u64,
    pub upload_octets: u64,
    pub total_octets: u64,
    pub download_mb: f64,
    pub upload_mb: f64,
    pub total_mb: f64,
    pub total_gb: f64,
    pub total_time_hours: f64,
    pub session_count: u64,
}

impl TopUser {
    pub fn new(username: String, totals: &UsageTotals) -> Self {
        Self {
            username,
            download_octets: totals.download_octets,
            upload_octets: totals.upload_octets,
            total_octets: totals.total_octets(),
            download_mb: octets_to_mb(totals.download_octets),
            upload_mb: octets_to_mb(totals.upload_octets),
            total_mb: octets_to_mb(totals.total_octets()),
            total_gb: octets_to_gb(totals.total_octets()),
            total_time_hours: seconds_to_hours(totals.time_seconds),
            session_count: totals.session_count,
        }
    }
}
