use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::catalog::EndpointTypeCatalog;
use crate::client::{HttpClient, ServiceEndpointClient};
use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub type SharedClients = Arc<Clients>;

/// API client plus the caches that belong with it, handed to every operation.
pub struct Clients {
    pub service_endpoints: Arc<dyn ServiceEndpointClient>,
    pub catalog: EndpointTypeCatalog,
    pub ready_poll_interval: Duration,
}

impl Clients {
    pub fn new(service_endpoints: Arc<dyn ServiceEndpointClient>) -> Self {
        Self {
            service_endpoints,
            catalog: EndpointTypeCatalog::new(),
            ready_poll_interval: Duration::from_secs(10),
        }
    }

    pub fn with_ready_poll_interval(mut self, interval: Duration) -> Self {
        self.ready_poll_interval = interval;
        self
    }

    pub fn from_config(config: &ProviderConfig) -> Result<SharedClients, ProviderError> {
        let http = HttpClient::new(config)?;
        Ok(Arc::new(
            Clients::new(Arc::new(http)).with_ready_poll_interval(config.ready_poll_interval),
        ))
    }
}

/// Clients shared by every resource and data source, filled in when Terraform
/// configures the provider.
#[derive(Clone, Default)]
pub struct ClientsHandle(Arc<OnceLock<SharedClients>>);

impl ClientsHandle {
    pub fn new(clients: SharedClients) -> Self {
        let handle = Self::default();
        handle.set(clients);
        handle
    }

    /// Install the clients. Later calls keep the first set.
    pub fn set(&self, clients: SharedClients) {
        if self.0.set(clients).is_err() {
            tracing::warn!("Provider configured more than once, keeping the first configuration");
        }
    }

    pub fn get(&self) -> Result<SharedClients, ProviderError> {
        self.0.get().cloned().ok_or_else(|| {
            ProviderError::Config("provider has not been configured".to_string())
        })
    }
}
