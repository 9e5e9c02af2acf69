use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::base::{
    sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_jenkins";
pub const ENDPOINT_TYPE: &str = "Jenkins";

const ACCEPT_UNTRUSTED_CERTS: &str = "AcceptUntrustedCerts";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JenkinsConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub accept_untrusted_certs: bool,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_hash: String,
}

impl EndpointConfig for JenkinsConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<JenkinsConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    Fields::new()
        .field(
            "url",
            Field::string()
                .required()
                .validate(Validator::HttpUrl)
                .description("URL of the Jenkins server"),
        )
        .field(
            "accept_untrusted_certs",
            Field::bool()
                .optional()
                .default(false)
                .description("Allow client connections to a Jenkins server with a self-signed certificate"),
        )
        .field(
            "username",
            Field::string()
                .required()
                .validate(Validator::NotWhitespace)
                .description("The Jenkins user name."),
        )
        .secret(
            "password",
            Field::string()
                .required()
                .validate(Validator::NotWhitespace)
                .description("The Jenkins password."),
        )
}

fn expand(config: &JenkinsConfig, endpoint: &mut ServiceEndpoint) -> Result<(), ProviderError> {
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(config.url.clone());
    endpoint.authorization = Some(EndpointAuthorization::new(
        "UsernamePassword",
        [
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ],
    ));
    endpoint.data = Some(HashMap::from([(
        ACCEPT_UNTRUSTED_CERTS.to_string(),
        config.accept_untrusted_certs.to_string(),
    )]));
    Ok(())
}

fn flatten(config: &mut JenkinsConfig, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
    if !endpoint
        .scheme()
        .is_some_and(|s| s.eq_ignore_ascii_case("UsernamePassword"))
    {
        return Err(unsupported_scheme(RESOURCE_NAME, endpoint));
    }

    if let Some(url) = &endpoint.url {
        config.url = url.clone();
    }
    if let Some(username) = endpoint.parameter("username") {
        config.username = username.to_string();
    }
    if let Some(accept) = endpoint.data_value(ACCEPT_UNTRUSTED_CERTS) {
        config.accept_untrusted_certs = accept.eq_ignore_ascii_case("true");
    }
    sync_secret(
        endpoint,
        "password",
        &mut config.password,
        &mut config.password_hash,
    )
}
