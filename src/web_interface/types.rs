use serde::{Deserialize, Serialize};

use crate::usage::{SessionSummary, UserUsage};

/// Error payload of the query endpoints
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopUsersQuery {
    pub limit: Option<u32>,
    pub period_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NasQuery {
    pub nasname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserBandwidthResponse {
    #[serde(flatten)]
    pub usage: UserUsage,
    pub active_sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
