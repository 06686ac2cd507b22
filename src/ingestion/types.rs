use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::session_management::EventOutcome;

/// Counter fields never reject an event: numbers, numeric strings, null and
/// missing all parse, anything unusable becomes zero.
fn lenient_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    })
}

/// Payload of `POST /accounting/radius`, as forwarded by the AAA daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RadiusAccountingRequest {
    pub username: String,
    pub session_id: String,
    pub status_type: String,
    #[serde(deserialize_with = "lenient_counter")]
    pub input_octets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub output_octets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub input_packets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub output_packets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub session_time: u64,
    pub nas_ip_address: Option<String>,
    pub nas_identifier: Option<String>,
    pub framed_ip_address: Option<String>,
    pub calling_station_id: Option<String>,
    pub called_station_id: Option<String>,
    pub terminate_cause: Option<String>,
}

/// Payload of the older `POST /accounting/accounting` endpoint.
///
/// Status types arrive lowercase (`start`, `interim-update`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LegacyAccountingRequest {
    pub username: String,
    pub session_id: String,
    pub status_type: String,
    #[serde(deserialize_with = "lenient_counter")]
    pub input_octets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub output_octets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub input_packets: u64,
    #[serde(deserialize_with = "lenient_counter")]
    pub output_packets: u64,
}

impl From<LegacyAccountingRequest> for RadiusAccountingRequest {
    fn from(legacy: LegacyAccountingRequest) -> Self {
        Self {
            username: legacy.username,
            session_id: legacy.session_id,
            status_type: title_case_status(&legacy.status_type),
            input_octets: legacy.input_octets,
            output_octets: legacy.output_octets,
            input_packets: legacy.input_packets,
            output_packets: legacy.output_packets,
            ..Default::default()
        }
    }
}

/// `interim-update` -> `Interim-Update`, `STOP` -> `Stop`.
pub fn title_case_status(raw: &str) -> String {
    raw.trim()
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// `{status, message[, error]}` returned for every ingested event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountingResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccountingResponse {
    pub fn success(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            error: None,
        }
    }

    pub fn failure(message: &str, error: &str) -> Self {
        Self {
            status: "error".to_string(),
            message: message.to_string(),
            error: Some(error.to_string()),
        }
    }
}

impl From<&EventOutcome> for AccountingResponse {
    fn from(outcome: &EventOutcome) -> Self {
        match outcome {
            EventOutcome::Created => Self::success("Session started"),
            EventOutcome::Updated => Self::success("Session updated"),
            EventOutcome::Closed => Self::success("Session stopped"),
            EventOutcome::Logged => Self::success("Post-Auth logged"),
            EventOutcome::DuplicateIgnored => {
                Self::success("Session already active, duplicate start ignored")
            }
            EventOutcome::OrphanIgnored => Self::success("No active session found, event ignored"),
            EventOutcome::Unrecognized => Self::success("Unknown status type acknowledged"),
            EventOutcome::Failed(reason) => Self::failure("Accounting processing failed", reason),
        }
    }
}
