use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{DataSource, DynamicDataSource};
use tf_provider::{DynamicResource, Resource};
use tf_provider::schema::{Attribute, AttributeConstraint, AttributeType};
use tf_provider::schema::{Block, Description, Schema};
use tf_provider::value::ValueEmpty;
use tf_provider::{Diagnostics, Provider};

use crate::config::ProviderConfig;
use crate::data_sources::{EndpointTypeDataSource, EndpointTypesDataSource};
use crate::error::ProviderError;
use crate::resources::{
    argocd, docker_registry, github, github_enterprise, jenkins, maven, run_pipeline, sonarqube,
};
use crate::schema::Value;
use crate::state::{Clients, ClientsHandle};

/// Name Terraform knows the provider by, and the prefix of every type it serves.
pub const PROVIDER_NAME: &str = "azuredevops";

/// Attributes of the `provider "azuredevops"` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub org_service_url: Value<String>,
    pub personal_access_token: Value<String>,
}

#[derive(Clone, Default)]
pub struct AzdoProvider {
    clients: ClientsHandle,
}

impl AzdoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle shared with every resource and data source this provider serves.
    pub fn clients(&self) -> &ClientsHandle {
        &self.clients
    }

    pub fn resource_names(&self) -> Vec<&'static str> {
        vec![
            argocd::RESOURCE_NAME,
            docker_registry::RESOURCE_NAME,
            github::RESOURCE_NAME,
            github_enterprise::RESOURCE_NAME,
            jenkins::RESOURCE_NAME,
            maven::RESOURCE_NAME,
            run_pipeline::RESOURCE_NAME,
            sonarqube::RESOURCE_NAME,
        ]
    }
}

fn known(value: &Value<String>) -> Option<String> {
    match value {
        Value::Value(s) => Some(s.clone()),
        _ => None,
    }
}

/// Type name as registered, without the provider prefix Terraform adds back.
fn short_name(type_name: &str) -> String {
    type_name
        .strip_prefix(PROVIDER_NAME)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(type_name)
        .to_string()
}

fn resource_entry<R: Resource + 'static>(
    type_name: &str,
    resource: R,
) -> (String, Box<dyn DynamicResource>) {
    (short_name(type_name), Box::new(resource))
}

fn data_source_entry<D: DataSource + 'static>(
    type_name: &str,
    data_source: D,
) -> (String, Box<dyn DynamicDataSource>) {
    (short_name(type_name), Box::new(data_source))
}

#[async_trait]
impl Provider for AzdoProvider {
    type Config<'a> = Value<ProviderSettings>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        let optional_string = |description: &'static str, sensitive: bool| Attribute {
            attr_type: AttributeType::String,
            description: Description::plain(description),
            constraint: AttributeConstraint::Optional,
            sensitive,
            ..Default::default()
        };

        Some(Schema {
            version: 1,
            block: Block {
                attributes: [
                    (
                        "org_service_url".to_string(),
                        optional_string(
                            "The URL of the Azure DevOps organization, defaults to AZDO_ORG_SERVICE_URL",
                            false,
                        ),
                    ),
                    (
                        "personal_access_token".to_string(),
                        optional_string(
                            "The personal access token, defaults to AZDO_PERSONAL_ACCESS_TOKEN",
                            true,
                        ),
                    ),
                ]
                .into_iter()
                .collect(),
                description: Description::plain("Azure DevOps service endpoints"),
                ..Default::default()
            },
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        let Value::Value(settings) = &config else {
            return Some(());
        };
        if let Some(url) = known(&settings.org_service_url).filter(|u| !u.is_empty()) {
            if let Err(e) = reqwest::Url::parse(&url) {
                return ProviderError::Validation(format!("org_service_url: {e}"))
                    .report(diags, "Invalid provider configuration");
            }
        }
        Some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let (org_service_url, personal_access_token) = match &config {
            Value::Value(settings) => (
                known(&settings.org_service_url),
                known(&settings.personal_access_token),
            ),
            _ => (None, None),
        };

        let clients = ProviderConfig::resolve(org_service_url, personal_access_token)
            .map_err(ProviderError::Config)
            .and_then(|config| {
                let clients = Clients::from_config(&config)?;
                Ok((config, clients))
            });
        match clients {
            Ok((config, clients)) => {
                self.clients.set(clients);
                tracing::info!(
                    "Configured provider for {} (terraform {terraform_version}, api {})",
                    config.org_service_url,
                    config.api_version
                );
                Some(())
            }
            Err(e) => e.report(diags, "Configuring provider"),
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        let clients = &self.clients;
        Some(HashMap::from([
            resource_entry(argocd::RESOURCE_NAME, argocd::resource().with_clients(clients.clone())),
            resource_entry(
                docker_registry::RESOURCE_NAME,
                docker_registry::resource().with_clients(clients.clone()),
            ),
            resource_entry(github::RESOURCE_NAME, github::resource().with_clients(clients.clone())),
            resource_entry(
                github_enterprise::RESOURCE_NAME,
                github_enterprise::resource().with_clients(clients.clone()),
            ),
            resource_entry(jenkins::RESOURCE_NAME, jenkins::resource().with_clients(clients.clone())),
            resource_entry(maven::RESOURCE_NAME, maven::resource().with_clients(clients.clone())),
            resource_entry(
                run_pipeline::RESOURCE_NAME,
                run_pipeline::resource().with_clients(clients.clone()),
            ),
            resource_entry(
                sonarqube::RESOURCE_NAME,
                sonarqube::resource().with_clients(clients.clone()),
            ),
        ]))
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(HashMap::from([
            data_source_entry(
                crate::data_sources::endpoint_type::DATA_SOURCE_NAME,
                EndpointTypeDataSource::new().with_clients(self.clients.clone()),
            ),
            data_source_entry(
                crate::data_sources::endpoint_types::DATA_SOURCE_NAME,
                EndpointTypesDataSource::new().with_clients(self.clients.clone()),
            ),
        ]))
    }
}

