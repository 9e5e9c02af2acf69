use serde::{Deserialize, Serialize};

use super::base::{
    param, sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, OAuthConfig, PersonalAuth,
    ServiceEndpointResource,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{block, Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_github";
pub const ENDPOINT_TYPE: &str = "github";
pub const GITHUB_URL: &str = "https://github.com";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default, with = "block")]
    pub auth_personal: Option<PersonalAuth>,
    #[serde(default, with = "block")]
    pub auth_oauth: Option<OAuthConfig>,
}

impl EndpointConfig for GitHubConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<GitHubConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    let personal = Fields::new().secret(
        "personal_access_token",
        Field::string()
            .required()
            .env_default("AZDO_GITHUB_SERVICE_CONNECTION_PAT")
            .validate(Validator::NotWhitespace)
            .description("The GitHub personal access token which should be used."),
    );
    let oauth = Fields::new().field(
        "oauth_configuration_id",
        Field::string().required(),
    );

    Fields::new()
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

fn expand(config: &GitHubConfig, endpoint: &mut ServiceEndpoint) -> Result<(), ProviderError> {
    let authorization = if let Some(oauth) = &config.auth_oauth {
        EndpointAuthorization::new(
            "OAuth",
            [
                ("ConfigurationId", oauth.oauth_configuration_id.as_str()),
                ("AccessToken", ""),
            ],
        )
    } else if let Some(personal) = &config.auth_personal {
        EndpointAuthorization::new(
            "Token",
            [("AccessToken", personal.personal_access_token.as_str())],
        )
    } else {
        EndpointAuthorization::new("InstallationToken", [] as [(&str, &str); 0])
    };

    endpoint.authorization = Some(authorization);
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(GITHUB_URL.to_string());
    Ok(())
}

fn flatten(config: &mut GitHubConfig, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
    match endpoint.scheme() {
        Some(s) if s.eq_ignore_ascii_case("OAuth") => {
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
                "AccessToken",
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
    Ok(())
}
