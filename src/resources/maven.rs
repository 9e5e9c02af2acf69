use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::base::{
    sync_secret, unsupported_scheme, BaseConfig, EndpointConfig, ServiceEndpointResource,
    TokenAuth,
};
use crate::error::ProviderError;
use crate::models::{EndpointAuthorization, ServiceEndpoint};
use crate::schema::{block, Field, Fields, Validator};

pub const RESOURCE_NAME: &str = "azuredevops_serviceendpoint_maven";
pub const ENDPOINT_TYPE: &str = "externalmavenrepository";

const REPOSITORY_ID: &str = "RepositoryId";

/// Maven's basic credential: the user name is not confidential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MavenBasicAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MavenConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub repository_id: String,
    #[serde(default, with = "block")]
    pub authentication_token: Option<TokenAuth>,
    #[serde(default, with = "block")]
    pub authentication_basic: Option<MavenBasicAuth>,
}

impl EndpointConfig for MavenConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseConfig {
        &mut self.base
    }
}

pub fn resource() -> ServiceEndpointResource<MavenConfig> {
    ServiceEndpointResource::new(RESOURCE_NAME, fields(), expand, flatten)
}

fn fields() -> Fields {
    const AUTH_BLOCKS: &[&str] = &["authentication_basic", "authentication_token"];

    let token = Fields::new().secret(
        "token",
        Field::string()
            .required()
            .description("The Maven access token."),
    );
    let basic = Fields::new()
        .field(
            "username",
            Field::string()
                .required()
                .description("The Maven user name."),
        )
        .secret(
            "password",
            Field::string()
                .required()
                .description("The Maven password."),
        );

    Fields::new()
        .field(
            "url",
            Field::string()
                .required()
                .validate(Validator::HttpUrl)
                .description("Url for the Maven Repository"),
        )
        .field(
            "repository_id",
            Field::string()
                .required()
                .validate(Validator::NotEmpty)
                .description("This is the ID of the server that matches the id element of the repository/mirror that Maven tries to connect to"),
        )
        .field(
            "authentication_token",
            Field::block(token)
                .optional()
                .exactly_one_of(AUTH_BLOCKS),
        )
        .field(
            "authentication_basic",
            Field::block(basic)
                .optional()
                .exactly_one_of(AUTH_BLOCKS),
        )
}

fn expand(config: &MavenConfig, endpoint: &mut ServiceEndpoint) -> Result<(), ProviderError> {
    endpoint.endpoint_type = Some(ENDPOINT_TYPE.to_string());
    endpoint.url = Some(config.url.clone());

    let authorization = match (&config.authentication_token, &config.authentication_basic) {
        (Some(auth), _) => {
            EndpointAuthorization::new("Token", [("apitoken", auth.token.as_str())])
        }
        (None, Some(auth)) => EndpointAuthorization::new(
            "UsernamePassword",
            [
                ("username", auth.username.as_str()),
                ("password", auth.password.as_str()),
            ],
        ),
        (None, None) => {
            return Err(ProviderError::Validation(
                "one of `authentication_basic,authentication_token` must be specified".to_string(),
            ));
        }
    };
    endpoint.authorization = Some(authorization);
    endpoint.data = Some(HashMap::from([(
        REPOSITORY_ID.to_string(),
        config.repository_id.clone(),
    )]));
    Ok(())
}

fn flatten(config: &mut MavenConfig, endpoint: &ServiceEndpoint) -> Result<(), ProviderError> {
    match endpoint.scheme() {
        Some(s) if s.eq_ignore_ascii_case("UsernamePassword") => {
            let auth = config
                .authentication_basic
                .get_or_insert_with(MavenBasicAuth::default);
            if let Some(username) = endpoint.parameter("username") {
                auth.username = username.to_string();
            }
            sync_secret(endpoint, "password", &mut auth.password, &mut auth.password_hash)?;
        }
        Some(s) if s.eq_ignore_ascii_case("Token") => {
            let auth = config.authentication_token.get_or_insert_with(TokenAuth::default);
            sync_secret(endpoint, "apitoken", &mut auth.token, &mut auth.token_hash)?;
        }
        _ => return Err(unsupported_scheme(RESOURCE_NAME, endpoint)),
    }

    if let Some(url) = &endpoint.url {
        config.url = url.clone();
    }
    if let Some(repository_id) = endpoint.data_value(REPOSITORY_ID) {
        config.repository_id = repository_id.to_string();
    }
    Ok(())
}
