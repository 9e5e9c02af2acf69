use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::base::{
    sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, PersonalAuth,
    ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{block, Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_runpipeline";
pub const ENDPOINT_TYPE: &str = "azdoapi";

const SERVICE_URL_PREFIX: &str = "https://dev.azure.com/";
const RELEASE_URL_PREFIX: &str = "https://vsrm.dev.azure.com/";

static ORGANIZATION_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://dev\.azure\.com/([^/]+)/?$").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunPipelineConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default, with = "block")]
    pub auth_personal: Option<PersonalAuth>,
}

impl EndpointConfig for RunPipelineConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<RunPipelineConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    let personal = Fields::new().secret(
        "personal_access_token",
        Field::string()
            .required()
            .env_default("AZDO_PERSONAL_ACCESS_TOKEN")
            .validate(Validator::NotWhitespace)
            .description("The Azure DevOps personal access token which should be used."),
    );

    Fields::new()
        .field(
            "organization_name",
            Field::string()
                .required()
                .validate(Validator::OrganizationName)
                .description("Azure DevOps organization name"),
        )
        .field(
            "auth_personal",
            Field::block(personal).required(),
        )
}

/// Organization name from a `https://dev.azure.com/<org>` service url.
pub fn organization_from_url(url: &str) -> Option<&str> {
    ORGANIZATION_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn expand(config: &RunPipelineConfig, endpoint: &mut ServiceEndpoint) -> Result<(), ProviderError> {
    let personal = config.auth_personal.as_ref().ok_or_else(|| {
        ProviderError::Validation("auth_personal: required attribute is not set".to_string())
    })?;
    let org = &config.organization_name;

    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.authorization = Some(EndpointAuthorization::new(
        "Token",
        [("apitoken", personal.personal_access_token.as_str())],
    ));
    endpoint.url = Some(format!("{SERVICE_URL_PREFIX}{org}"));
    endpoint.data = Some(HashMap::from([(
        "releaseUrl".to_string(),
        format!("{RELEASE_URL_PREFIX}{org}"),
    )]));
    Ok(())
}

fn flatten(config: &mut RunPipelineConfig, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
    if !endpoint
        .scheme()
        .is_some_and(|s| s.eq_ignore_ascii_case("Token"))
    {
        return Err(unsupported_scheme(RESOURCE_NAME, endpoint));
    }

    if let Some(org) = endpoint.url.as_deref().and_then(organization_from_url) {
        config.organization_name = org.to_string();
    }

    let auth = config.auth_personal.get_or_insert_with(PersonalAuth::default);
    sync_secret(
        endpoint,
        "apitoken",
        &mut auth.personal_access_token,
        &mut auth.personal_access_token_hash,
    )
}
