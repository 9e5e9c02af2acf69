pub mod argocd;
pub mod base;
pub mod crud;
pub mod docker_registry;
pub mod github;
pub mod github_enterprise;
pub mod jenkins;
pub mod maven;
pub mod plan;
pub mod run_pipeline;
pub mod sonarqube;
pub mod terraform;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::schema::{Attributes, Fields};
use crate::state::Clients;

pub use base::{BaseConfig, EndpointConfig, ServiceEndpointResource, Timeouts};
pub use crud::parse_import_id;
pub use plan::PlannedChange;

/// A service endpoint resource at the level of Terraform attribute maps.
#[async_trait]
pub trait EndpointResource: Send + Sync {
    fn type_name(&self) -> &str;
    fn fields(&self) -> &Fields;
    fn validate(&self, config: &Attributes) -> Result<(), ProviderError>;
    /// Plan `config` against `prior`, or a create when there is no prior state.
    fn plan(
        &self,
        prior: Option<&Attributes>,
        config: &Attributes,
    ) -> Result<PlannedChange, ProviderError>;
    async fn create(&self, clients: &Clients, planned: Attributes) -> Result<Attributes, ProviderError>;
    /// `Ok(None)` when the remote object no longer exists.
    async fn read(
        &self,
        clients: &Clients,
        state: Attributes,
    ) -> Result<Option<Attributes>, ProviderError>;
    async fn update(&self, clients: &Clients, planned: Attributes) -> Result<Attributes, ProviderError>;
    async fn delete(&self, clients: &Clients, state: Attributes) -> Result<(), ProviderError>;
    async fn import(&self, clients: &Clients, import_id: &str) -> Result<Attributes, ProviderError>;
}
