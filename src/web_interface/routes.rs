use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, warn};
use serde::Serialize;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{reply, Filter, Rejection, Reply};

use super::types::{
    ApiError, DailyQuery, HealthResponse, NasQuery, PeriodQuery, TopUsersQuery,
    UserBandwidthResponse,
};
use super::web_server::ApiState;
use crate::error_handling::types::StorageError;
use crate::ingestion::{AccountingResponse, LegacyAccountingRequest, RadiusAccountingRequest};
use crate::usage::MAX_REPORT_DAYS;

const MAX_EVENT_BYTES: u64 = 64 * 1024;

/// Runs a store query under the request budget.
async fn bounded<T, F>(budget: Duration, query: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(budget, query).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(budget.as_millis() as u64)),
    }
}

fn json_or_500<T: Serialize>(result: Result<T, StorageError>, context: &str) -> Response {
    match result {
        Ok(body) => reply::with_status(reply::json(&body), StatusCode::OK).into_response(),
        Err(e) => {
            error!("{}: {}", context, e);
            reply::with_status(
                reply::json(&ApiError {
                    error: format!("{}: {}", context, e),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response()
        }
    }
}

/// Rejects day counts past `MAX_REPORT_DAYS` with a 400.
fn report_days(name: &str, days: u32) -> Result<u32, Response> {
    if days <= MAX_REPORT_DAYS {
        return Ok(days);
    }
    warn!("Rejected {}={}", name, days);
    Err(reply::with_status(
        reply::json(&ApiError {
            error: format!("{} must be at most {}", name, MAX_REPORT_DAYS),
        }),
        StatusCode::BAD_REQUEST,
    )
    .into_response())
}

/// POST /accounting/radius
///
/// Always answers 200; failures are carried in the body.
pub fn radius_accounting_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "radius")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_EVENT_BYTES))
        .and(warp::body::bytes())
        .and_then(move |body: Bytes| {
            let state = state.clone();
            async move {
                let response = match serde_json::from_slice::<RadiusAccountingRequest>(&body) {
                    Ok(request) => AccountingResponse::from(&state.gateway.ingest(request).await),
                    Err(e) => {
                        warn!("Rejected malformed accounting payload: {}", e);
                        AccountingResponse::failure("Invalid accounting payload", &e.to_string())
                    }
                };
                Ok::<_, Rejection>(reply::with_status(reply::json(&response), StatusCode::OK))
            }
        })
}

/// POST /accounting/accounting
///
/// Older simplified payload; processing failures map to 500.
pub fn legacy_accounting_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "accounting")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_EVENT_BYTES))
        .and(warp::body::bytes())
        .and_then(move |body: Bytes| {
            let state = state.clone();
            async move {
                let (response, status) =
                    match serde_json::from_slice::<LegacyAccountingRequest>(&body) {
                        Ok(legacy) => {
                            let outcome = state
                                .gateway
                                .ingest(RadiusAccountingRequest::from(legacy))
                                .await;
                            let status = if outcome.is_failure() {
                                StatusCode::INTERNAL_SERVER_ERROR
                            } else {
                                StatusCode::OK
                            };
                            (AccountingResponse::from(&outcome), status)
                        }
                        Err(e) => (
                            AccountingResponse::failure(
                                "Invalid accounting payload",
                                &e.to_string(),
                            ),
                            StatusCode::BAD_REQUEST,
                        ),
                    };
                Ok::<_, Rejection>(reply::with_status(reply::json(&response), status))
            }
        })
}

/// GET /accounting/active-sessions
pub fn active_sessions_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "active-sessions")
        .and(warp::get())
        .and_then(move || {
            let state = state.clone();
            async move {
                let result = bounded(
                    state.settings.store_timeout(),
                    state.usage.active_sessions(Utc::now()),
                )
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to load active sessions"))
            }
        })
}

/// GET /accounting/bandwidth-stats?period_days=N
pub fn bandwidth_stats_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "bandwidth-stats")
        .and(warp::get())
        .and(warp::query::<PeriodQuery>())
        .and_then(move |query: PeriodQuery| {
            let state = state.clone();
            async move {
                let days = query
                    .period_days
                    .unwrap_or(state.settings.default_period_days);
                let days = match report_days("period_days", days) {
                    Ok(days) => days,
                    Err(rejected) => return Ok::<_, Rejection>(rejected),
                };
                let result = bounded(
                    state.settings.store_timeout(),
                    state.usage.global_usage(days, Utc::now()),
                )
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to compute bandwidth stats"))
            }
        })
}

/// GET /accounting/user-bandwidth/{username}?period_days=N
pub fn user_bandwidth_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "user-bandwidth" / String)
        .and(warp::get())
        .and(warp::query::<PeriodQuery>())
        .and_then(move |username: String, query: PeriodQuery| {
            let state = state.clone();
            async move {
                let days = query
                    .period_days
                    .unwrap_or(state.settings.default_period_days);
                let days = match report_days("period_days", days) {
                    Ok(days) => days,
                    Err(rejected) => return Ok::<_, Rejection>(rejected),
                };
                let now = Utc::now();
                let result = bounded(state.settings.store_timeout(), async {
                    let usage = state.usage.user_usage(&username, days, now).await?;
                    let active_sessions = state.usage.user_sessions(&username, true, now).await?;
                    Ok::<_, StorageError>(UserBandwidthResponse {
                        usage,
                        active_sessions,
                    })
                })
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to compute user bandwidth"))
            }
        })
}

/// GET /accounting/daily-stats?days=N
pub fn daily_stats_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "daily-stats")
        .and(warp::get())
        .and(warp::query::<DailyQuery>())
        .and_then(move |query: DailyQuery| {
            let state = state.clone();
            async move {
                let days = query.days.unwrap_or(state.settings.default_daily_days);
                let days = match report_days("days", days) {
                    Ok(days) => days,
                    Err(rejected) => return Ok::<_, Rejection>(rejected),
                };
                let result = bounded(
                    state.settings.store_timeout(),
                    state.usage.daily_usage(days, Utc::now()),
                )
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to compute daily stats"))
            }
        })
}

/// GET /accounting/top-users?limit=N&period_days=N
pub fn top_users_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "top-users")
        .and(warp::get())
        .and(warp::query::<TopUsersQuery>())
        .and_then(move |query: TopUsersQuery| {
            let state = state.clone();
            async move {
                let limit = query.limit.unwrap_or(state.settings.default_top_limit) as usize;
                let days = query
                    .period_days
                    .unwrap_or(state.settings.default_period_days);
                let days = match report_days("period_days", days) {
                    Ok(days) => days,
                    Err(rejected) => return Ok::<_, Rejection>(rejected),
                };
                let result = bounded(
                    state.settings.store_timeout(),
                    state.usage.top_users(limit, days, Utc::now()),
                )
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to compute top users"))
            }
        })
}

/// GET /accounting/nas-list?nasname=X
pub fn nas_list_route(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("accounting" / "nas-list")
        .and(warp::get())
        .and(warp::query::<NasQuery>())
        .and_then(move |query: NasQuery| {
            let state = state.clone();
            async move {
                let result = bounded(
                    state.settings.store_timeout(),
                    state.registry.list_filtered(query.nasname.as_deref()),
                )
                .await;
                Ok::<_, Rejection>(json_or_500(result, "Failed to load NAS list"))
            }
        })
}

/// GET /health
pub fn health_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .map(|| reply::json(&HealthResponse { status: "ok" }))
}

/// Every endpoint, with request logging.
pub fn api_routes(
    state: Arc<ApiState>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    radius_accounting_route(state.clone())
        .or(legacy_accounting_route(state.clone()))
        .or(active_sessions_route(state.clone()))
        .or(bandwidth_stats_route(state.clone()))
        .or(user_bandwidth_route(state.clone()))
        .or(daily_stats_route(state.clone()))
        .or(top_users_route(state.clone()))
        .or(nas_list_route(state))
        .or(health_route())
        .with(warp::log("radacct::api"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::AccountingConfig;
    use crate::storage::test_support::{seed_nas, temp_storage, BrokenStore};
    use crate::storage::{AccountingStore, DatabaseStorage};
    use serde_json::Value;
    use warp::test::request;

    async fn state() -> (Arc<DatabaseStorage>, Arc<ApiState>) {
        let storage = temp_storage().await;
        let state = ApiState::new(
            storage.clone(),
            storage.clone(),
            storage.clone(),
            &AccountingConfig::default(),
        );
        (storage, Arc::new(state))
    }

    fn broken_state(store: Arc<BrokenStore>, timeout_ms: u64) -> Arc<ApiState> {
        let settings = AccountingConfig {
            store_timeout_ms: timeout_ms,
            ..Default::default()
        };
        Arc::new(ApiState::new(store.clone(), store.clone(), store, &settings))
    }

    fn event(status: &str, session_id: &str, input: u64, output: u64) -> Value {
        serde_json::json!({
            "username": "alice",
            "session_id": session_id,
            "status_type": status,
            "input_octets": input,
            "output_octets": output,
            "session_time": 120,
            "nas_ip_address": "10.0.0.1",
            "calling_station_id": "",
        })
    }

    fn body(res: &warp::http::Response<Bytes>) -> Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[tokio::test]
    async fn test_radius_lifecycle_over_http() {
        let (_storage, state) = state().await;
        let api = api_routes(state);

        let res = request()
            .method("POST")
            .path("/accounting/radius")
            .json(&event("Start", "S1", 0, 0))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(&res)["status"], "success");

        let res = request().path("/accounting/active-sessions").reply(&api).await;
        let active = body(&res);
        assert_eq!(active.as_array().unwrap().len(), 1);
        assert_eq!(active[0]["session_id"], "S1");
        assert_eq!(active[0]["calling_station_id"], Value::Null);

        request()
            .method("POST")
            .path("/accounting/radius")
            .json(&event("Stop", "S1", 5000, 9000))
            .reply(&api)
            .await;

        let res = request()
            .path("/accounting/user-bandwidth/alice?period_days=1")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let report = body(&res);
        assert_eq!(report["total_octets"], 14000);
        assert_eq!(report["session_count"], 1);
        assert_eq!(report["active_sessions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_acknowledged_with_error() {
        let (_storage, state) = state().await;
        let api = api_routes(state);

        let res = request()
            .method("POST")
            .path("/accounting/radius")
            .body("{not json")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = body(&res);
        assert_eq!(json["status"], "error");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_orphan_and_unknown_status_are_success() {
        let (_storage, state) = state().await;
        let api = api_routes(state);

        for status in ["Interim-Update", "Accounting-Off", "Post-Auth"] {
            let res = request()
                .method("POST")
                .path("/accounting/radius")
                .json(&event(status, "NOPE", 1, 1))
                .reply(&api)
                .await;
            assert_eq!(body(&res)["status"], "success", "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_legacy_endpoint_title_cases_status() {
        let (storage, state) = state().await;
        let api = api_routes(state);

        let res = request()
            .method("POST")
            .path("/accounting/accounting")
            .json(&serde_json::json!({
                "username": "bob",
                "session_id": "L1",
                "status_type": "start",
                "input_octets": 0,
                "output_octets": 0,
            }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(&res)["message"], "Session started");
        assert!(storage
            .find_open_session("bob", "L1")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_report_endpoints() {
        let (storage, state) = state().await;
        seed_nas(&storage, "10.0.0.1", "ap-lobby", "s3cret").await;
        let api = api_routes(state);

        request()
            .method("POST")
            .path("/accounting/radius")
            .json(&event("Start", "S1", 0, 0))
            .reply(&api)
            .await;

        let res = request()
            .path("/accounting/bandwidth-stats?period_days=7")
            .reply(&api)
            .await;
        let stats = body(&res);
        assert_eq!(stats["period_days"], 7);
        assert_eq!(stats["active_users_count"], 1);
        assert!(stats["timestamp"].is_string());

        let res = request().path("/accounting/daily-stats?days=3").reply(&api).await;
        let daily = body(&res);
        assert_eq!(daily.as_array().unwrap().len(), 3);
        assert_eq!(daily[2]["session_count"], 1);

        let res = request()
            .path("/accounting/top-users?limit=5&period_days=1")
            .reply(&api)
            .await;
        assert_eq!(body(&res)[0]["username"], "alice");

        let res = request().path("/accounting/nas-list").reply(&api).await;
        let text = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(text.contains("ap-lobby"));
        assert!(!text.contains("s3cret"));

        let res = request()
            .path("/accounting/nas-list?nasname=10.9.9.9")
            .reply(&api)
            .await;
        assert_eq!(body(&res).as_array().unwrap().len(), 0);

        let res = request().path("/health").reply(&api).await;
        assert_eq!(body(&res)["status"], "ok");
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let (_storage, state) = state().await;
        let api = api_routes(state);
        let res = request()
            .path("/accounting/daily-stats?days=-4")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_day_ranges_are_rejected() {
        let (_storage, state) = state().await;
        let api = api_routes(state);

        for path in [
            "/accounting/bandwidth-stats?period_days=4000000000",
            "/accounting/user-bandwidth/alice?period_days=4000000000",
            "/accounting/top-users?period_days=4000000000",
            "/accounting/daily-stats?days=4000000000",
            "/accounting/daily-stats?days=3661",
        ] {
            let res = request().path(path).reply(&api).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
            let json = body(&res);
            assert!(json["error"].as_str().unwrap().contains("at most"), "{}", path);
        }

        let res = request()
            .path("/accounting/daily-stats?days=3660")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(&res).as_array().unwrap().len(), 3660);
    }

    #[tokio::test]
    async fn test_query_store_failure_answers_500() {
        let api = api_routes(broken_state(BrokenStore::unreachable(), 1000));

        for path in [
            "/accounting/active-sessions",
            "/accounting/bandwidth-stats",
            "/accounting/user-bandwidth/alice",
            "/accounting/daily-stats?days=2",
            "/accounting/top-users",
            "/accounting/nas-list",
        ] {
            let res = request().path(path).reply(&api).await;
            assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", path);
            let json = body(&res);
            assert!(json["error"].as_str().unwrap().contains("unreachable"), "{}", path);
        }
    }

    #[tokio::test]
    async fn test_slow_query_answers_500_after_budget() {
        let api = api_routes(broken_state(
            BrokenStore::slow(std::time::Duration::from_millis(500)),
            20,
        ));

        let res = request()
            .path("/accounting/bandwidth-stats?period_days=7")
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body(&res);
        assert!(json["error"].as_str().unwrap().contains("timed out after 20 ms"));
    }

    #[tokio::test]
    async fn test_ingestion_failure_status_per_endpoint() {
        let api = api_routes(broken_state(BrokenStore::unreachable(), 1000));

        let res = request()
            .method("POST")
            .path("/accounting/radius")
            .json(&event("Start", "S1", 0, 0))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body(&res)["status"], "error");

        let res = request()
            .method("POST")
            .path("/accounting/accounting")
            .json(&serde_json::json!({
                "username": "bob",
                "session_id": "L1",
                "status_type": "start",
            }))
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body(&res);
        assert_eq!(json["status"], "error");
        assert!(json["error"].is_string());
    }
}
