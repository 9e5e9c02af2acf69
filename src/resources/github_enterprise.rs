use serde::{Deserialize, Serialize};

use super::base::{
    param, sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, OAuthConfig, PersonalAuth,
    ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{block, Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_github_enterprise";
pub const ENDPOINT_TYPE: &str = "githubenterprise";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubEnterpriseConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub url: String,
    #[serde(default, with = "block")]
    pub auth_personal: Option<PersonalAuth>,
    #[serde(default, with = "block")]
    pub auth_oauth: Option<OAuthConfig>,
}

impl EndpointConfig for GitHubEnterpriseConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<GitHubEnterpriseConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    let personal = Fields::new().secret(
        "personal_access_token",
        Field::string()
            .required()
            .env_default("AZDO_GITHUB_ENTERPRISE_SERVICE_CONNECTION_PAT")
            .validate(Validator::NotWhitespace)
            .description("The GitHub personal access token which should be used."),
    );
    let oauth = Fields::new().field(
        "oauth_configuration_id",
        Field::string().required(),
    );

    Fields::new()
        .field(
            "url",
            Field::string()
                .optional()
                .validate(Validator::HttpUrl)
                .description("URL of the GitHub Enterprise server"),
        )
        .field(
            "auth_personal",
            Field::block(personal)
                .optional()
                .conflicts_with(&["auth_oauth"]),
        )
        .field(
            "auth_oauth",
            Field::block(oauth)
                .optional()
                .conflicts_with(&["auth_personal"]),
        )
}

fn expand(
    config: &GitHubEnterpriseConfig,
    endpoint: &mut ServiceEndpoint,
) -> Result<(), ProviderError> {
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(config.url.clone());

    let authorization = if let Some(oauth) = &config.auth_oauth {
        EndpointAuthorization::new(
            "OAuth2",
            [
                ("ConfigurationId", oauth.oauth_configuration_id.as_str()),
                ("AccessToken", ""),
            ],
        )
    } else if let Some(personal) = &config.auth_personal {
        EndpointAuthorization::new(
            "Token",
            [("apitoken", personal.personal_access_token.as_str())],
        )
    } else {
        EndpointAuthorization::new("InstallationToken", [] as [(&str, &str); 0])
    };
    endpoint.authorization = Some(authorization);
    Ok(())
}

fn flatten(
    config: &mut GitHubEnterpriseConfig,
    endpoint: &ServiceEndpoint,
) -> Result<(), ProviderError> {
    match endpoint.scheme() {
        Some(s) if s.eq_ignore_ascii_case("OAuth2") => {
            config.auth_personal = None;
            config.auth_oauth = Some(OAuthConfig {
                oauth_configuration_id: param(endpoint, "ConfigurationId"),
            });
        }
        Some(s) if s.eq_ignore_ascii_case("Token") => {
            config.auth_oauth = None;
            let auth = config.auth_personal.get_or_insert_with(PersonalAuth::default);
            sync_secret(
                endpoint,
                "apitoken",
                &mut auth.personal_access_token,
                &mut auth.personal_access_token_hash,
            )?;
        }
        Some(s) if s.eq_ignore_ascii_case("InstallationToken") => {
            config.auth_personal = None;
            config.auth_oauth = None;
        }
        _ => return Err(unsupported_scheme(RESOURCE_NAME, endpoint)),
    }

    if let Some(url) = &endpoint.url {
        config.url = url.clone();
    }
    Ok(())
}
