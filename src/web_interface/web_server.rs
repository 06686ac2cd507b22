use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::info;

use super::routes::api_routes;
use crate::configuration::types::{AccountingConfig, ServerConfig};
use crate::error_handling::types::WebError;
use crate::ingestion::IngestionGateway;
use crate::nas_registry::NasRegistry;
use crate::session_management::LifecycleHandler;
use crate::storage::{AccountingStore, CredentialDirectory, NasDirectory};
use crate::usage::UsageAggregator;

/// Services shared by every route, built once at startup.
pub struct ApiState {
    pub gateway: IngestionGateway,
    pub usage: UsageAggregator,
    pub registry: NasRegistry,
    pub settings: AccountingConfig,
}

impl ApiState {
    /// Wires every service onto the given backends.
    pub fn new(
        store: Arc<dyn AccountingStore>,
        nas: Arc<dyn NasDirectory>,
        credentials: Arc<dyn CredentialDirectory>,
        settings: &AccountingConfig,
    ) -> Self {
        let registry = NasRegistry::new(nas);
        let handler = LifecycleHandler::new(store.clone());
        Self {
            gateway: IngestionGateway::new(handler, registry.clone(), settings),
            usage: UsageAggregator::new(store, credentials),
            registry,
            settings: settings.clone(),
        }
    }
}

/// HTTP server for accounting ingestion and usage reports
pub struct WebServer {
    state: Arc<ApiState>,
}

impl WebServer {
    pub fn new(state: ApiState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Serves until Ctrl-C, then drains in-flight requests.
    pub async fn start(&self, config: &ServerConfig) -> Result<(), WebError> {
        let ip: IpAddr = config.bind_address.parse().map_err(|e| WebError::Bind {
            addr: config.bind_address.clone(),
            reason: format!("{}", e),
        })?;
        let addr = SocketAddr::new(ip, config.port);

        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        };
        let (bound, server) = warp::serve(api_routes(self.state.clone()))
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .map_err(|e| WebError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        info!("Accounting API listening on http://{}", bound);
        server.await;
        info!("Accounting API stopped");
        Ok(())
    }
}
