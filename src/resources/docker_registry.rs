use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::base::{
    sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_dockerregistry";
pub const ENDPOINT_TYPE: &str = "dockerregistry";

/// Azure DevOps stores hub.docker.com for both registry types.
pub const DOCKER_HUB_URL: &str = "https://hub.docker.com/";
pub const DEFAULT_REGISTRY: &str = "https://index.docker.io/v1/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerRegistryConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub docker_registry: String,
    #[serde(default)]
    pub docker_username: String,
    #[serde(default)]
    pub docker_password: String,
    #[serde(default)]
    pub docker_password_hash: String,
    #[serde(default)]
    pub docker_email: String,
    #[serde(default)]
    pub registry_type: String,
}

impl EndpointConfig for DockerRegistryConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<DockerRegistryConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    Fields::new()
        .field(
            "docker_registry",
            Field::string()
                .required()
                .env_default("AZDO_DOCKERREGISTRY_SERVICE_CONNECTION_REGISTRY")
                .default(DEFAULT_REGISTRY)
                .description("The DockerRegistry registry which should be used."),
        )
        .field(
            "docker_username",
            Field::string()
                .optional()
                .env_default("AZDO_DOCKERREGISTRY_SERVICE_CONNECTION_USERNAME")
                .description("The DockerRegistry username which should be used."),
        )
        .secret(
            "docker_password",
            Field::string()
                .optional()
                .env_default("AZDO_DOCKERREGISTRY_SERVICE_CONNECTION_PASSWORD")
                .description("The DockerRegistry password which should be used."),
        )
        .field(
            "docker_email",
            Field::string()
                .optional()
                .env_default("AZDO_DOCKERREGISTRY_SERVICE_CONNECTION_EMAIL")
                .description("The DockerRegistry email address which should be used."),
        )
        .field(
            "registry_type",
            Field::string()
                .required()
                .force_new()
                .env_default("AZDO_DOCKERREGISTRY_SERVICE_CONNECTION_REGISTRY_TYPE")
                .default("DockerHub")
                .validate(Validator::OneOf(vec!["DockerHub", "Others"])),
        )
}

fn expand(
    config: &DockerRegistryConfig,
    endpoint: &mut ServiceEndpoint,
) -> Result<(), ProviderError> {
    endpoint.authorization = Some(EndpointAuthorization::new(
        "UsernamePassword",
        [
            ("registry", config.docker_registry.as_str()),
            ("username", config.docker_username.as_str()),
            ("password", config.docker_password.as_str()),
            ("email", config.docker_email.as_str()),
        ],
    ));
    endpoint.data = Some(HashMap::from([(
        "registrytype".to_string(),
        config.registry_type.clone(),
    )]));
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(DOCKER_HUB_URL.to_string());
    Ok(())
}

fn flatten(
    config: &mut DockerRegistryConfig,
    endpoint: &ServiceEndpoint,
) -> Result<(), ProviderError> {
    if !endpoint
        .scheme()
        .is_some_and(|s| s.eq_ignore_ascii_case("UsernamePassword"))
    {
        return Err(unsupported_scheme(RESOURCE_NAME, endpoint));
    }

    if let Some(registry) = endpoint.parameter("registry") {
        config.docker_registry = registry.to_string();
    }
    if let Some(email) = endpoint.parameter("email") {
        config.docker_email = email.to_string();
    }
    if let Some(username) = endpoint.parameter("username") {
        config.docker_username = username.to_string();
    }
    if let Some(registry_type) = endpoint.data_value("registrytype") {
        config.registry_type = registry_type.to_string();
    }
    sync_secret(
        endpoint,
        "password",
        &mut config.docker_password,
        &mut config.docker_password_hash,
    )
}
