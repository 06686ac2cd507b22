use std::sync::Arc;

use log::{debug, info, warn};

use crate::error_handling::types::StorageError;
use crate::session_management::event::{non_blank, stored_counter, AccountingEvent};
use crate::session_management::EventOutcome;
use crate::storage::storage_trait::AccountingStore;
use crate::storage::types::{InsertOutcome, NewSession, SessionUpdate};

/// Applies Start / Interim-Update / Stop / Post-Auth events to the store.
///
/// Holds nothing but the store handle; it is built once at startup and
/// shared by every request.
#[derive(Clone)]
pub struct LifecycleHandler {
    store: Arc<dyn AccountingStore>,
}

impl LifecycleHandler {
    pub fn new(store: Arc<dyn AccountingStore>) -> Self {
        Self { store }
    }

    /// Opens a new record, or reports a duplicate if the lineage is already open.
    pub async fn apply_start(&self, event: &AccountingEvent) -> Result<EventOutcome, StorageError> {
        let session = NewSession {
            session_id: event.session_id.clone(),
            unique_id: event.unique_id(),
            username: event.username.clone(),
            nas_address: event.nas_address.clone(),
            start_time: event.received_at,
            input_octets: stored_counter(event.input_octets),
            output_octets: stored_counter(event.output_octets),
            called_station_id: non_blank(event.called_station_id.clone()),
            calling_station_id: non_blank(event.calling_station_id.clone()),
            framed_ip_address: non_blank(event.framed_ip_address.clone()),
        };
        match self.store.insert_session(&session).await? {
            InsertOutcome::Inserted => {
                info!(
                    "Session started for user {}, session {} (unique id {}, NAS {})",
                    event.username, event.session_id, session.unique_id, event.nas_address
                );
                Ok(EventOutcome::Created)
            }
            InsertOutcome::AlreadyOpen => {
                warn!(
                    "Session already exists for user {}, session {}; duplicate Start ignored",
                    event.username, event.session_id
                );
                Ok(EventOutcome::DuplicateIgnored)
            }
        }
    }

    /// Overwrites the open record's counters with the latest report.
    pub async fn apply_interim_update(
        &self,
        event: &AccountingEvent,
    ) -> Result<EventOutcome, StorageError> {
        let update = Self::snapshot(event, None);
        if self.store.update_open_session(&update).await? {
            debug!(
                "Session updated for user {}, session {}: in={} out={} time={}s",
                event.username,
                event.session_id,
                event.input_octets,
                event.output_octets,
                event.session_time
            );
            Ok(EventOutcome::Updated)
        } else {
            warn!(
                "No active session found for update: user {}, session {}",
                event.username, event.session_id
            );
            Ok(EventOutcome::OrphanIgnored)
        }
    }

    /// Closes the open record with final counters and terminate cause.
    pub async fn apply_stop(&self, event: &AccountingEvent) -> Result<EventOutcome, StorageError> {
        let update = Self::snapshot(event, non_blank(event.terminate_cause.clone()));
        if self.store.close_open_session(&update).await? {
            info!(
                "Session stopped for user {}, session {}, duration: {}s, total bytes: {}",
                event.username,
                event.session_id,
                event.session_time,
                event.input_octets.saturating_add(event.output_octets)
            );
            Ok(EventOutcome::Closed)
        } else {
            warn!(
                "No active session found for user {}, session {}; Stop ignored",
                event.username, event.session_id
            );
            Ok(EventOutcome::OrphanIgnored)
        }
    }

    /// Post-Auth never touches the store.
    pub async fn apply_post_auth(
        &self,
        event: &AccountingEvent,
    ) -> Result<EventOutcome, StorageError> {
        info!(
            "RADIUS POST-AUTH: session notification for {} from {}",
            event.username, event.nas_address
        );
        Ok(EventOutcome::Logged)
    }

    fn snapshot(event: &AccountingEvent, terminate_cause: Option<String>) -> SessionUpdate {
        SessionUpdate {
            username: event.username.clone(),
            session_id: event.session_id.clone(),
            at: event.received_at,
            input_octets: stored_counter(event.input_octets),
            output_octets: stored_counter(event.output_octets),
            session_duration_seconds: stored_counter(event.session_time),
            terminate_cause,
        }
    }
}
