use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::ServiceEndpointClient;
use crate::error::ProviderError;
use crate::models::{AuthenticationScheme, ServiceEndpointType};

#[derive(Debug, Clone)]
pub enum CatalogState {
    Empty,
    Populated(Arc<Vec<ServiceEndpointType>>),
    Failed(String),
}

/// What `CatalogState` a catalog is in, without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    Empty,
    Populated,
    Failed,
}

/// Endpoint type catalog, fetched from the API at most once until `reset`.
///
/// A failed fetch is remembered and handed to every later caller; there is no retry.
pub struct EndpointTypeCatalog {
    state: Mutex<CatalogState>,
}

impl EndpointTypeCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState::Empty),
        }
    }

    /// All endpoint types, fetching them on first use.
    pub async fn types(
        &self,
        client: &dyn ServiceEndpointClient,
    ) -> Result<Arc<Vec<ServiceEndpointType>>, ProviderError> {
        // Held across the fetch so concurrent first callers wait for one request.
        let mut state = self.state.lock().await;

        if let CatalogState::Empty = *state {
            tracing::debug!("Fetching service endpoint type catalog");
            *state = match client.get_service_endpoint_types().await {
                Ok(types) => {
                    tracing::info!("Cached {} service endpoint types", types.len());
                    CatalogState::Populated(Arc::new(types))
                }
                Err(e) => {
                    tracing::warn!("Service endpoint type catalog fetch failed: {e}");
                    CatalogState::Failed(e.to_string())
                }
            };
        }

        match &*state {
            CatalogState::Populated(types) if types.is_empty() => Err(ProviderError::NotFound(
                "no service endpoint types found".to_string(),
            )),
            CatalogState::Populated(types) => Ok(types.clone()),
            CatalogState::Failed(msg) => Err(ProviderError::Catalog(msg.clone())),
            CatalogState::Empty => Err(ProviderError::Catalog(
                "catalog was not populated".to_string(),
            )),
        }
    }

    /// Case-insensitive exact match on the type name.
    pub async fn find_type(
        &self,
        client: &dyn ServiceEndpointClient,
        name: &str,
    ) -> Result<ServiceEndpointType, ProviderError> {
        let types = self.types(client).await?;
        types
            .iter()
            .find(|t| t.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .cloned()
            .ok_or_else(|| {
                ProviderError::NotFound(format!("service endpoint type not found with name {name}"))
            })
    }

    pub async fn status(&self) -> CatalogStatus {
        match &*self.state.lock().await {
            CatalogState::Empty => CatalogStatus::Empty,
            CatalogState::Populated(_) => CatalogStatus::Populated,
            CatalogState::Failed(_) => CatalogStatus::Failed,
        }
    }

    /// Drop whatever is cached so the next lookup fetches again.
    pub async fn reset(&self) {
        *self.state.lock().await = CatalogState::Empty;
    }
}

impl Default for EndpointTypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Find `scheme` (case-insensitive) among the type's authentication schemes.
pub fn find_scheme<'a>(
    endpoint_type: &'a ServiceEndpointType,
    scheme: &str,
) -> Result<&'a AuthenticationScheme, ProviderError> {
    let type_name = endpoint_type.name.as_deref().unwrap_or_default();

    if endpoint_type.authentication_schemes.is_empty() {
        return Err(ProviderError::NotFound(format!(
            "no authentication schemes available for service endpoint type '{type_name}'"
        )));
    }

    endpoint_type
        .authentication_schemes
        .iter()
        .find(|s| s.scheme.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(scheme)))
        .ok_or_else(|| {
            ProviderError::NotFound(format!(
                "authorization scheme '{scheme}' not found for service endpoint type '{type_name}'. Available schemes: [{}]",
                endpoint_type.scheme_names().join(", ")
            ))
        })
}
