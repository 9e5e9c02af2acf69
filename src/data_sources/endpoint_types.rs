use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tf_provider::DataSource;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::Diagnostics;

use super::within;
use crate::error::ProviderError;
use crate::models::ServiceEndpointType;
use crate::schema::{value, Attributes, Field, FieldKind, Fields, State, Value};
use crate::state::{Clients, ClientsHandle};

pub const DATA_SOURCE_NAME: &str = "azuredevops_serviceendpoint_types";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointTypeSummary {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub ui_contribution_id: String,
    pub authentication_schemes: Vec<String>,
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointTypesState {
    pub id: String,
    pub types: Vec<EndpointTypeSummary>,
}

/// Every endpoint type the organization offers.
pub struct EndpointTypesDataSource {
    fields: Fields,
    clients: ClientsHandle,
}

impl EndpointTypesDataSource {
    pub fn new() -> Self {
        let fields = Fields::new()
            .field(
                "id",
                Field::string()
                    .computed()
                    .description("A hash of the names of all listed types"),
            )
            .field(
                "types",
                Field::objects(vec![
                    ("name", FieldKind::String),
                    ("display_name", FieldKind::String),
                    ("description", FieldKind::String),
                    ("ui_contribution_id", FieldKind::String),
                    ("authentication_schemes", FieldKind::List),
                    ("parameters", FieldKind::Map),
                ])
                .computed()
                .description("The service endpoint types available in the organization"),
            );
        Self {
            fields,
            clients: ClientsHandle::default(),
        }
    }

    pub fn with_clients(mut self, clients: ClientsHandle) -> Self {
        self.clients = clients;
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub async fn list(&self, clients: &Clients) -> Result<EndpointTypesState, ProviderError> {
        let types = clients
            .catalog
            .types(clients.service_endpoints.as_ref())
            .await?;

        let mut summaries: Vec<EndpointTypeSummary> = types.iter().map(summarize).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(EndpointTypesState {
            id: listing_id(summaries.iter().map(|s| s.name.as_str())),
            types: summaries,
        })
    }

    pub async fn read_attributes(&self, clients: &Clients) -> Result<Attributes, ProviderError> {
        let listed = within(self.list(clients)).await?;
        Ok(value::attributes_from_json(serde_json::to_value(listed)?))
    }
}

impl Default for EndpointTypesDataSource {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(t: &ServiceEndpointType) -> EndpointTypeSummary {
    EndpointTypeSummary {
        name: t.name.clone().unwrap_or_default(),
        display_name: t.display_name.clone().unwrap_or_default(),
        description: t.description.clone().unwrap_or_default(),
        ui_contribution_id: t.ui_contribution_id.clone().unwrap_or_default(),
        authentication_schemes: t.scheme_names(),
        parameters: t.parameter_defaults(),
    }
}

/// SHA-256 hex of the sorted, comma-joined type names.
pub fn listing_id<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.collect();
    names.sort_unstable();
    hex::encode(Sha256::digest(names.join(",").as_bytes()))
}

#[async_trait]
impl DataSource for EndpointTypesDataSource {
    type State<'a> = State;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: self
                .fields
                .to_block("Use this data source to list the service endpoint types of an organization."),
        })
    }

    async fn validate<'a>(&self, _diags: &mut Diagnostics, _config: Self::State<'a>) -> Option<()> {
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        _config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let result = match self.clients.get() {
            Ok(clients) => self.read_attributes(&clients).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(state) => Some(Value::Value(state)),
            Err(e) => e.report(diags, "Listing service endpoint types"),
        }
    }
}
