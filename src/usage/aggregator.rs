use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::debug;

use crate::error_handling::types::StorageError;
use crate::storage::session_filter::{by_username, open_sessions, overlapping, usage_window};
use crate::storage::storage_trait::{AccountingStore, CredentialDirectory};
use crate::usage::types::{
    octets_to_gb, octets_to_mb, seconds_to_hours, DailyUsage, GlobalUsage, SessionSummary,
    TopUser, UsageTotals, UserUsage,
};

/// Longest day range a report may cover.
pub const MAX_REPORT_DAYS: u32 = 3660;

/// Read-only usage queries over the session store.
///
/// Every query is a snapshot; sessions still being updated make the figures
/// approximate. `now` is passed in so callers control the clock.
#[derive(Clone)]
pub struct UsageAggregator {
    store: Arc<dyn AccountingStore>,
    credentials: Arc<dyn CredentialDirectory>,
}

impl UsageAggregator {
    pub fn new(store: Arc<dyn AccountingStore>, credentials: Arc<dyn CredentialDirectory>) -> Self {
        Self { store, credentials }
    }

    /// Open sessions, newest start first.
    pub async fn active_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let records = self.store.get_sessions(&open_sessions()).await?;
        Ok(records
            .iter()
            .map(|r| SessionSummary::from_record(r, now))
            .collect())
    }

    pub async fn user_sessions(
        &self,
        username: &str,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionSummary>, StorageError> {
        let records = self
            .store
            .get_sessions(&by_username(username, active_only))
            .await?;
        Ok(records
            .iter()
            .map(|r| SessionSummary::from_record(r, now))
            .collect())
    }

    /// Totals for one user over sessions started in the last `period_days`,
    /// plus any older session that is still open.
    pub async fn user_usage(
        &self,
        username: &str,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> Result<UserUsage, StorageError> {
        let filter = usage_window(Some(username.to_string()), window_start(period_days, now));
        let records = self.store.get_sessions(&filter).await?;
        let totals = UsageTotals::collect(&records, now);
        debug!(
            "Usage for {} over {} days: {} sessions, {} octets",
            username,
            period_days,
            totals.session_count,
            totals.total_octets()
        );
        Ok(UserUsage::new(username, period_days, &totals))
    }

    pub async fn global_usage(
        &self,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> Result<GlobalUsage, StorageError> {
        let records = self
            .store
            .get_sessions(&usage_window(None, window_start(period_days, now)))
            .await?;
        let totals = UsageTotals::collect(&records, now);

        let open = self.store.get_sessions(&open_sessions()).await?;
        let active_users: HashSet<&str> = open
            .iter()
            .map(|r| r.username.as_str())
            .filter(|u| !u.is_empty())
            .collect();
        let total_users = self.credentials.distinct_username_count().await?;

        Ok(GlobalUsage {
            period_days,
            download_octets: totals.download_octets,
            upload_octets: totals.upload_octets,
            total_octets: totals.total_octets(),
            download_mb: octets_to_mb(totals.download_octets),
            upload_mb: octets_to_mb(totals.upload_octets),
            total_mb: octets_to_mb(totals.total_octets()),
            total_gb: octets_to_gb(totals.total_octets()),
            total_time_hours: seconds_to_hours(totals.time_seconds),
            session_count: totals.session_count,
            active_users_count: active_users.len() as u64,
            total_users_count: total_users,
            timestamp: now,
        })
    }

    /// `days` consecutive UTC days ending today, oldest first.
    ///
    /// A session counts toward every day its `[start, stop_or_now)` interval
    /// overlaps, with its full cumulative counters. Per-day byte figures are
    /// therefore an approximation, not a partition of traffic.
    ///
    /// `days` is clamped to `MAX_REPORT_DAYS`.
    pub async fn daily_usage(
        &self,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyUsage>, StorageError> {
        let days = i64::from(days.min(MAX_REPORT_DAYS));
        if days == 0 {
            return Ok(Vec::new());
        }
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let first = today - Duration::days(days - 1);
        let end = today + Duration::days(1);
        let records = self.store.get_sessions(&overlapping(first, end)).await?;

        // Each record lands once on its first..=last day index
        let mut buckets = vec![UsageTotals::default(); days as usize];
        for record in &records {
            let Some(start) = record.start_time else {
                continue;
            };
            let first_day = day_index(first, start).max(0);
            let last_day = record
                .stop_time
                .map_or(days - 1, |stop| day_index(first, stop))
                .min(days - 1);
            for bucket in first_day..=last_day {
                buckets[bucket as usize].add(record, now);
            }
        }

        let series = buckets
            .iter()
            .enumerate()
            .map(|(offset, totals)| {
                let from = first + Duration::days(offset as i64);
                DailyUsage {
                    date: from.format("%Y-%m-%d").to_string(),
                    download_octets: totals.download_octets,
                    upload_octets: totals.upload_octets,
                    total_octets: totals.total_octets(),
                    download_mb: octets_to_mb(totals.download_octets),
                    upload_mb: octets_to_mb(totals.upload_octets),
                    total_mb: octets_to_mb(totals.total_octets()),
                    session_count: totals.session_count,
                }
            })
            .collect();
        Ok(series)
    }

    /// Heaviest users by total octets over the period; ties broken by name.
    pub async fn top_users(
        &self,
        limit: usize,
        period_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<TopUser>, StorageError> {
        let records = self
            .store
            .get_sessions(&usage_window(None, window_start(period_days, now)))
            .await?;

        let mut per_user: BTreeMap<&str, UsageTotals> = BTreeMap::new();
        for record in records.iter().filter(|r| !r.username.is_empty()) {
            per_user
                .entry(record.username.as_str())
                .or_default()
                .add(record, now);
        }

        let mut ranked: Vec<(&str, UsageTotals)> = per_user.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.total_octets()
                .cmp(&a.1.total_octets())
                .then_with(|| a.0.cmp(b.0))
        });
        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(username, totals)| TopUser::new(username.to_string(), &totals))
            .collect())
    }
}

/// Start of a `period_days` window, saturating at the earliest representable instant.
fn window_start(period_days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    Duration::try_days(i64::from(period_days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Whole UTC days from `first` (a midnight) to `at`, negative before it.
fn day_index(first: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at - first).num_seconds().div_euclid(86_400)
}
