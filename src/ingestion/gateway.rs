use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, warn};

use crate::configuration::types::AccountingConfig;
use crate::error_handling::types::GatewayError;
use crate::ingestion::types::RadiusAccountingRequest;
use crate::nas_registry::NasRegistry;
use crate::session_management::{
    non_blank, AccountingEvent, EventOutcome, LifecycleHandler, StatusType,
};

/// Boundary between the AAA daemon and the lifecycle handler.
///
/// Never returns an error: store failures, timeouts and malformed events all
/// come back as `EventOutcome::Failed`.
#[derive(Clone)]
pub struct IngestionGateway {
    handler: LifecycleHandler,
    registry: NasRegistry,
    default_nas_address: String,
    timeout: Duration,
}

impl IngestionGateway {
    pub fn new(
        handler: LifecycleHandler,
        registry: NasRegistry,
        config: &AccountingConfig,
    ) -> Self {
        Self {
            handler,
            registry,
            default_nas_address: config.default_nas_address.clone(),
            timeout: config.store_timeout(),
        }
    }

    /// Sanitizes a payload into an event stamped with `received_at`.
    pub fn normalize(
        &self,
        request: RadiusAccountingRequest,
        received_at: DateTime<Utc>,
    ) -> AccountingEvent {
        AccountingEvent {
            status: StatusType::parse(&request.status_type),
            username: request.username,
            session_id: request.session_id.trim().to_string(),
            nas_address: non_blank(request.nas_ip_address)
                .map(|a| a.trim().to_string())
                .unwrap_or_else(|| self.default_nas_address.clone()),
            nas_identifier: non_blank(request.nas_identifier),
            framed_ip_address: non_blank(request.framed_ip_address),
            calling_station_id: non_blank(request.calling_station_id),
            called_station_id: non_blank(request.called_station_id),
            terminate_cause: non_blank(request.terminate_cause),
            input_octets: request.input_octets,
            output_octets: request.output_octets,
            input_packets: request.input_packets,
            output_packets: request.output_packets,
            session_time: request.session_time,
            received_at,
        }
    }

    pub async fn ingest(&self, request: RadiusAccountingRequest) -> EventOutcome {
        self.ingest_at(request, Utc::now()).await
    }

    pub async fn ingest_at(
        &self,
        request: RadiusAccountingRequest,
        received_at: DateTime<Utc>,
    ) -> EventOutcome {
        let event = self.normalize(request, received_at);
        let result = match tokio::time::timeout(self.timeout, self.process(&event)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_millis() as u64)),
        };
        match result {
            Ok(outcome) => {
                debug!(
                    "{} for user {}, session {}: {}",
                    event.status,
                    event.username,
                    event.session_id,
                    outcome.label()
                );
                outcome
            }
            Err(e) => {
                error!(
                    "Accounting {} failed for user {}, session {}, NAS {}: {}",
                    event.status, event.username, event.session_id, event.nas_address, e
                );
                EventOutcome::Failed(e.to_string())
            }
        }
    }

    async fn process(&self, event: &AccountingEvent) -> Result<EventOutcome, GatewayError> {
        self.annotate(event).await;
        let needs_session = matches!(
            event.status,
            StatusType::Start | StatusType::InterimUpdate | StatusType::Stop
        );
        if needs_session && event.session_id.is_empty() {
            warn!(
                "{} for user {} carries no session id, rejected",
                event.status, event.username
            );
            return Ok(EventOutcome::Failed("missing session_id".to_string()));
        }
        let outcome = match &event.status {
            StatusType::Start => self.handler.apply_start(event).await?,
            StatusType::InterimUpdate => self.handler.apply_interim_update(event).await?,
            StatusType::Stop => self.handler.apply_stop(event).await?,
            StatusType::PostAuth => self.handler.apply_post_auth(event).await?,
            StatusType::Unknown(raw) => {
                warn!(
                    "Unknown accounting status type '{}' for user {}, session {}",
                    raw, event.username, event.session_id
                );
                EventOutcome::Unrecognized
            }
        };
        Ok(outcome)
    }

    // Unknown NAS devices are logged, never rejected
    async fn annotate(&self, event: &AccountingEvent) {
        match self.registry.lookup(&event.nas_address).await {
            Ok(Some(nas)) => debug!(
                "Event from NAS {} ({})",
                event.nas_address,
                nas.shortname.as_deref().unwrap_or("unnamed")
            ),
            Ok(None) => warn!(
                "Accounting event from unregistered NAS {} (identifier {})",
                event.nas_address,
                event.nas_identifier.as_deref().unwrap_or("-")
            ),
            Err(e) => warn!("NAS lookup failed for {}: {}", event.nas_address, e),
        }
    }
}
