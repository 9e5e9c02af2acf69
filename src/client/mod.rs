pub mod http;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::models::{ServiceEndpoint, ServiceEndpointType};

pub use http::HttpClient;

/// The slice of the Azure DevOps service endpoint API the provider consumes.
#[async_trait]
pub trait ServiceEndpointClient: Send + Sync {
    async fn create_service_endpoint(
        &self,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError>;

    /// `Ok(None)` when the API answers with an empty body for an endpoint that no longer exists.
    async fn get_service_endpoint_details(
        &self,
        project_id: Uuid,
        endpoint_id: Uuid,
    ) -> Result<Option<ServiceEndpoint>, ProviderError>;

    async fn update_service_endpoint(
        &self,
        endpoint_id: Uuid,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError>;

    async fn delete_service_endpoint(
        &self,
        endpoint_id: Uuid,
        project_ids: &[Uuid],
    ) -> Result<(), ProviderError>;

    async fn get_service_endpoint_types(&self) -> Result<Vec<ServiceEndpointType>, ProviderError>;

    /// Resolve a project name (or id) to the project's id.
    async fn get_project_id(&self, name_or_id: &str) -> Result<Uuid, ProviderError>;
}
