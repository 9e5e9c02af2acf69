use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProviderError;
use crate::models::{
    ProjectReference, ServiceEndpoint, ServiceEndpointProjectReference, OWNER_LIBRARY,
};
use crate::schema::{Field, Fields, Validator};
use crate::secret;
use crate::state::ClientsHandle;

pub const DEFAULT_DESCRIPTION: &str = "Managed by Terraform";

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

/// Attributes every service endpoint resource carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub project_id: Uuid,
    #[serde(default)]
    pub service_endpoint_name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub authorization: HashMap<String, String>,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            id: None,
            project_id: Uuid::nil(),
            service_endpoint_name: String::new(),
            description: default_description(),
            authorization: HashMap::new(),
        }
    }
}

/// Typed configuration of one endpoint kind, built from the untyped attribute map.
pub trait EndpointConfig:
    Serialize + DeserializeOwned + Clone + Debug + Default + Send + Sync + 'static
{
    fn base(&self) -> &BaseConfig;
    fn base_mut(&mut self) -> &mut BaseConfig;
}

pub type ExpandFn<C> = fn(&C, &mut ServiceEndpoint) -> Result<(), ProviderError>;
pub type FlattenFn<C> = fn(&mut C, &ServiceEndpoint) -> Result<(), ProviderError>;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(2 * 60),
            read: Duration::from_secs(60),
            update: Duration::from_secs(2 * 60),
            delete: Duration::from_secs(2 * 60),
        }
    }
}

/// A service endpoint resource: fields, timeouts, importer and the CRUD engine
/// bound to one kind's expand and flatten.
pub struct ServiceEndpointResource<C> {
    pub(crate) type_name: &'static str,
    pub(crate) fields: Fields,
    pub(crate) timeouts: Timeouts,
    pub(crate) expand: ExpandFn<C>,
    pub(crate) flatten: FlattenFn<C>,
    pub(crate) clients: ClientsHandle,
}

impl<C: EndpointConfig> ServiceEndpointResource<C> {
    pub fn new(
        type_name: &'static str,
        fields: Fields,
        expand: ExpandFn<C>,
        flatten: FlattenFn<C>,
    ) -> Self {
        Self {
            type_name,
            fields: base_fields().merge(fields),
            timeouts: Timeouts::default(),
            expand,
            flatten,
            clients: ClientsHandle::default(),
        }
    }

    /// Share the clients the provider sets up once Terraform configures it.
    pub fn with_clients(mut self, clients: ClientsHandle) -> Self {
        self.clients = clients;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Base expansion followed by the kind's own mapping.
    pub fn expand(&self, config: &C) -> Result<ServiceEndpoint, ProviderError> {
        let mut endpoint = do_base_expansion(config.base());
        (self.expand)(config, &mut endpoint)?;
        Ok(endpoint)
    }

    /// Base flattening followed by the kind's own mapping.
    pub fn flatten(&self, config: &mut C, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
        do_base_flattening(config.base_mut(), endpoint);
        (self.flatten)(config, endpoint)
    }
}

pub fn base_fields() -> Fields {
    Fields::new()
        .field(
            "id",
            Field::string()
                .computed()
                .description("The ID of the service endpoint"),
        )
        .field(
            "project_id",
            Field::string()
                .required()
                .force_new()
                .validate(Validator::NotWhitespace)
                .description("The ID of the project the service endpoint belongs to"),
        )
        .field(
            "service_endpoint_name",
            Field::string()
                .required()
                .force_new()
                .validate(Validator::NotWhitespace)
                .description("The name of the service endpoint"),
        )
        .field(
            "description",
            Field::string()
                .optional()
                .default(DEFAULT_DESCRIPTION)
                .validate(Validator::NotWhitespace)
                .description("The description of the service endpoint"),
        )
        .field(
            "authorization",
            Field::map()
                .computed()
                .description("The authorization scheme reported by Azure DevOps"),
        )
}

pub fn do_base_expansion(base: &BaseConfig) -> ServiceEndpoint {
    ServiceEndpoint {
        id: base.id,
        name: Some(base.service_endpoint_name.clone()),
        owner: Some(OWNER_LIBRARY.to_string()),
        description: Some(base.description.clone()),
        service_endpoint_project_references: vec![ServiceEndpointProjectReference {
            project_reference: ProjectReference {
                id: base.project_id,
                name: None,
            },
            name: Some(base.service_endpoint_name.clone()),
            description: Some(base.description.clone()),
        }],
        ..Default::default()
    }
}

pub fn do_base_flattening(base: &mut BaseConfig, endpoint: &ServiceEndpoint) {
    base.id = endpoint.id;
    if let Some(name) = &endpoint.name {
        base.service_endpoint_name = name.clone();
    }
    if let Some(description) = &endpoint.description {
        base.description = description.clone();
    }
    if let Some(project_id) = endpoint.first_project_id() {
        base.project_id = project_id;
    }
    base.authorization = endpoint
        .scheme()
        .map(|s| HashMap::from([("scheme".to_string(), s.to_string())]))
        .unwrap_or_default();
}

/// Authorization parameter as an owned string, empty when absent.
pub(crate) fn param(endpoint: &ServiceEndpoint, key: &str) -> String {
    endpoint.parameter(key).unwrap_or_default().to_string()
}

/// Adopt a secret the API echoed back, otherwise keep the configured one, then
/// refresh its memo. Azure DevOps normally blanks confidential parameters.
pub(crate) fn sync_secret(
    endpoint: &ServiceEndpoint,
    key: &str,
    value: &mut String,
    memo: &mut String,
) -> Result<(), ProviderError> {
    if let Some(echoed) = endpoint.parameter(key).filter(|v| !v.is_empty()) {
        *value = echoed.to_string();
    }
    secret::refresh(value, memo)
}

/// Error for a scheme a kind's flatten has no mapping for.
pub(crate) fn unsupported_scheme(resource: &str, endpoint: &ServiceEndpoint) -> ProviderError {
    ProviderError::UnsupportedScheme {
        resource: resource.to_string(),
        scheme: endpoint.scheme().unwrap_or("<none>").to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAuth {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub token_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub username_hash: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalAuth {
    #[serde(default)]
    pub personal_access_token: String,
    #[serde(default)]
    pub personal_access_token_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub oauth_configuration_id: String,
}
