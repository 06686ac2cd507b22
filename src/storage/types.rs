use chrono::{DateTime, Utc};

use crate::storage::db_entities::{nas, radacct};

/// One accounting row, as seen by the rest of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: i64,
    pub session_id: String,
    pub unique_id: String,
    pub username: String,
    pub nas_address: String,
    pub start_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub session_duration_seconds: Option<i64>,
    pub input_octets: Option<i64>,
    pub output_octets: Option<i64>,
    pub called_station_id: Option<String>,
    pub calling_station_id: Option<String>,
    pub framed_ip_address: Option<String>,
    pub terminate_cause: Option<String>,
}

impl SessionRecord {
    pub fn is_active(&self) -> bool {
        self.stop_time.is_none()
    }

    /// Reported duration when the NAS sent one, otherwise the elapsed time
    /// between start and stop (or `now` for open sessions).
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> i64 {
        if let Some(reported) = self.session_duration_seconds.filter(|d| *d > 0) {
            return reported;
        }
        match self.start_time {
            Some(start) => (self.stop_time.unwrap_or(now) - start).num_seconds().max(0),
            None => 0,
        }
    }

    /// Seconds since start, ignoring any reported duration.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.start_time
            .map(|start| (now - start).num_seconds().max(0))
            .unwrap_or(0)
    }

    pub fn input(&self) -> u64 {
        self.input_octets.unwrap_or(0).max(0) as u64
    }

    pub fn output(&self) -> u64 {
        self.output_octets.unwrap_or(0).max(0) as u64
    }

    pub fn total_octets(&self) -> u64 {
        self.input().saturating_add(self.output())
    }

    /// Whether `[start_time, stop_time_or_now)` touches `[from, to)`.
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        match self.start_time {
            Some(start) => start < to && self.stop_time.map_or(true, |stop| stop >= from),
            None => false,
        }
    }
}

impl From<radacct::Model> for SessionRecord {
    fn from(row: radacct::Model) -> Self {
        Self {
            id: row.radacctid,
            session_id: row.acctsessionid,
            unique_id: row.acctuniqueid,
            username: row.username.unwrap_or_default(),
            nas_address: row.nasipaddress,
            start_time: row.acctstarttime,
            update_time: row.acctupdatetime,
            stop_time: row.acctstoptime,
            session_duration_seconds: row.acctsessiontime,
            input_octets: row.acctinputoctets,
            output_octets: row.acctoutputoctets,
            called_station_id: row.calledstationid,
            calling_station_id: row.callingstationid,
            framed_ip_address: row.framedipaddress,
            terminate_cause: row.acctterminatecause,
        }
    }
}

/// Values for a record created by a Start event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: String,
    pub unique_id: String,
    pub username: String,
    pub nas_address: String,
    pub start_time: DateTime<Utc>,
    pub input_octets: i64,
    pub output_octets: i64,
    pub called_station_id: Option<String>,
    pub calling_station_id: Option<String>,
    pub framed_ip_address: Option<String>,
}

/// Counter snapshot applied to the open record of a lineage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    pub username: String,
    pub session_id: String,
    pub at: DateTime<Utc>,
    pub input_octets: i64,
    pub output_octets: i64,
    pub session_duration_seconds: i64,
    pub terminate_cause: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An open record already exists for the (username, session id) pair
    AlreadyOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NasRecord {
    pub id: i32,
    pub name: String,
    pub short_name: Option<String>,
    pub nas_type: Option<String>,
    pub ports: Option<i32>,
    pub secret: String,
    pub server: Option<String>,
    pub community: Option<String>,
    pub description: Option<String>,
}

impl From<nas::Model> for NasRecord {
    fn from(row: nas::Model) -> Self {
        Self {
            id: row.id,
            name: row.nasname,
            short_name: row.shortname,
            nas_type: row.nas_type,
            ports: row.ports,
            secret: row.secret,
            server: row.server,
            community: row.community,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub username: Option<String>,
    pub open_only: bool,
    /// Started at or after this instant, or still open
    pub window_since: Option<DateTime<Utc>>,
    /// Interval `[start, stop_or_open)` overlaps `[from, to)`
    pub overlapping: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(start: Option<DateTime<Utc>>, stop: Option<DateTime<Utc>>) -> SessionRecord {
        SessionRecord {
            id: 1,
            session_id: "S1".into(),
            unique_id: "S1-abc".into(),
            username: "alice".into(),
            nas_address: "10.0.0.1".into(),
            start_time: start,
            update_time: None,
            stop_time: stop,
            session_duration_seconds: None,
            input_octets: None,
            output_octets: None,
            called_station_id: None,
            calling_station_id: None,
            framed_ip_address: None,
            terminate_cause: None,
        }
    }

    #[test]
    fn test_duration_prefers_reported_value() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut r = record(Some(start), Some(start + Duration::seconds(300)));
        r.session_duration_seconds = Some(120);
        assert_eq!(r.duration_seconds(start + Duration::hours(5)), 120);

        r.session_duration_seconds = Some(0);
        assert_eq!(r.duration_seconds(start + Duration::hours(5)), 300);
    }

    #[test]
    fn test_duration_of_open_session_runs_to_now() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let r = record(Some(start), None);
        assert_eq!(r.duration_seconds(start + Duration::seconds(42)), 42);
        assert_eq!(record(None, None).duration_seconds(start), 0);
    }

    #[test]
    fn test_null_and_negative_counters_count_as_zero() {
        let mut r = record(None, None);
        assert_eq!(r.total_octets(), 0);
        r.input_octets = Some(-5);
        r.output_octets = Some(10);
        assert_eq!(r.total_octets(), 10);
    }

    #[test]
    fn test_overlap_spans_midnight() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let stop = Utc.with_ymd_and_hms(2026, 3, 2, 1, 0, 0).unwrap();
        let r = record(Some(start), Some(stop));
        let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let day2 = day1 + Duration::days(1);
        let day3 = day2 + Duration::days(1);
        assert!(r.overlaps(day1, day2));
        assert!(r.overlaps(day2, day3));
        assert!(!r.overlaps(day3, day3 + Duration::days(1)));
    }
}
