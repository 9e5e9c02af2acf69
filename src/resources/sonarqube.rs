use serde::{Deserialize, Serialize};

use super::base::{
    sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_sonarqube";
pub const ENDPOINT_TYPE: &str = "sonarqube";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SonarQubeConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub token_hash: String,
}

impl EndpointConfig for SonarQubeConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<SonarQubeConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    Fields::new()
        .field(
            "url",
            Field::string()
                .required()
                .validate(Validator::HttpUrl)
                .description("URL of the SonarQube server to connect with."),
        )
        .secret(
            "token",
            Field::string()
                .required()
                .validate(Validator::NotWhitespace)
                .description("Authentication Token generated through SonarQube (go to My Account > Security > Generate Tokens)."),
        )
}

// SonarQube takes the token as the user name of a basic credential.
fn expand(config: &SonarQubeConfig, endpoint: &mut ServiceEndpoint) -> Result<(), ProviderError> {
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(config.url.clone());
    endpoint.authorization = Some(EndpointAuthorization::new(
        "UsernamePassword",
        [("username", config.token.as_str())],
    ));
    Ok(())
}

fn flatten(config: &mut SonarQubeConfig, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
    if !endpoint
        .scheme()
        .is_some_and(|s| s.eq_ignore_ascii_case("UsernamePassword"))
    {
        return Err(unsupported_scheme(RESOURCE_NAME, endpoint));
    }

    if let Some(url) = &endpoint.url {
        config.url = url.clone();
    }
    sync_secret(endpoint, "username", &mut config.token, &mut config.token_hash)
}
