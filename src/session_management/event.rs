use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::session_management::StatusType;

/// A normalized accounting event, stamped with its ingestion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingEvent {
    pub status: StatusType,
    pub username: String,
    pub session_id: String,
    pub nas_address: String,
    pub nas_identifier: Option<String>,
    pub framed_ip_address: Option<String>,
    pub calling_station_id: Option<String>,
    pub called_station_id: Option<String>,
    pub terminate_cause: Option<String>,
    pub input_octets: u64,
    pub output_octets: u64,
    pub input_packets: u64,
    pub output_packets: u64,
    pub session_time: u64,
    pub received_at: DateTime<Utc>,
}

impl AccountingEvent {
    /// Bare event with zero counters; mostly for callers building events by hand.
    pub fn new(
        status: StatusType,
        username: &str,
        session_id: &str,
        nas_address: &str,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            username: username.to_string(),
            session_id: session_id.to_string(),
            nas_address: nas_address.to_string(),
            nas_identifier: None,
            framed_ip_address: None,
            calling_station_id: None,
            called_station_id: None,
            terminate_cause: None,
            input_octets: 0,
            output_octets: 0,
            input_packets: 0,
            output_packets: 0,
            session_time: 0,
            received_at,
        }
    }

    pub fn with_counters(mut self, input: u64, output: u64, session_time: u64) -> Self {
        self.input_octets = input;
        self.output_octets = output;
        self.session_time = session_time;
        self
    }

    /// Globally unique id of the record a Start of this event creates.
    ///
    /// The first 16 characters of the session id, then 15 hex digits of a
    /// SHA-256 over NAS, username, session id and ingestion time. At most 32
    /// ASCII characters for ASCII session ids.
    pub fn unique_id(&self) -> String {
        let prefix: String = self.session_id.chars().take(16).collect();
        let mut hasher = Sha256::new();
        hasher.update(self.nas_address.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.username.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.session_id.as_bytes());
        hasher.update(self.received_at.timestamp_micros().to_be_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}-{}", prefix, &hex[..15])
    }
}

/// Blank or whitespace-only strings become `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Counters are stored signed; anything above `i64::MAX` saturates.
pub(crate) fn stored_counter(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
