use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::DataSource;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::Diagnostics;

use super::within;
use crate::catalog::find_scheme;
use crate::error::ProviderError;
use crate::models::ServiceEndpointType;
use crate::schema::{value, Attributes, Field, Fields, State, Validator, Value};
use crate::state::{Clients, ClientsHandle};

pub const DATA_SOURCE_NAME: &str = "azuredevops_serviceendpoint_type";

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointTypeQuery {
    pub name: String,
    #[serde(default)]
    pub authorization_scheme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointTypeState {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_scheme: Option<String>,
    pub display_name: String,
    pub description: String,
    pub ui_contribution_id: String,
    pub authentication_schemes: Vec<String>,
    pub parameters: HashMap<String, String>,
    pub authorization_parameters: HashMap<String, String>,
}

pub struct EndpointTypeDataSource {
    fields: Fields,
    clients: ClientsHandle,
}

impl EndpointTypeDataSource {
    pub fn new() -> Self {
        let computed = |description: &'static str| Field::string().computed().description(description);
        let fields = Fields::new()
            .field(
                "name",
                Field::string()
                    .required()
                    .validate(Validator::NotEmpty)
                    .description("The name of the service endpoint type"),
            )
            .field(
                "authorization_scheme",
                Field::string()
                    .optional()
                    .description("The authorization scheme to retrieve parameters for"),
            )
            .field("id", computed("The ID of the service endpoint type"))
            .field("display_name", computed("The display name of the service endpoint type"))
            .field("description", computed("The description of the service endpoint type"))
            .field(
                "ui_contribution_id",
                computed("The UI contribution ID for this service endpoint type"),
            )
            .field(
                "authentication_schemes",
                Field::list()
                    .computed()
                    .description("Available authentication schemes for this service endpoint type"),
            )
            .field(
                "parameters",
                Field::map()
                    .computed()
                    .description("Map of default values for each possible parameter for the service endpoint"),
            )
            .field(
                "authorization_parameters",
                Field::map()
                    .computed()
                    .description("Map of default values for each possible authorization parameter (only set if authorization_scheme is provided)"),
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

    /// Look `query.name` up in the catalog and describe it.
    pub async fn lookup(
        &self,
        clients: &Clients,
        query: &EndpointTypeQuery,
    ) -> Result<EndpointTypeState, ProviderError> {
        if query.name.is_empty() {
            return Err(ProviderError::Validation("'name' must be specified".to_string()));
        }

        let found = clients
            .catalog
            .find_type(clients.service_endpoints.as_ref(), &query.name)
            .await?;

        let scheme = query
            .authorization_scheme
            .as_deref()
            .filter(|s| !s.is_empty());
        let authorization_parameters = match scheme {
            Some(scheme) => find_scheme(&found, scheme)?.parameter_defaults(),
            None => HashMap::new(),
        };

        Ok(describe(
            &found,
            &query.name,
            query.authorization_scheme.clone(),
            authorization_parameters,
        ))
    }

    /// Full data source state for a configuration.
    pub async fn read_attributes(
        &self,
        clients: &Clients,
        config: &Attributes,
    ) -> Result<Attributes, ProviderError> {
        let mut config = config.clone();
        self.fields.apply_defaults(&mut config);
        self.fields.validate(&config)?;
        let query: EndpointTypeQuery = serde_json::from_value(value::attributes_to_json(&config))
            .map_err(|e| ProviderError::Validation(e.to_string()))?;

        let found = within(self.lookup(clients, &query)).await?;
        let mut state = value::attributes_from_json(serde_json::to_value(found)?);
        self.fields.complete(&mut state);
        Ok(state)
    }
}

impl Default for EndpointTypeDataSource {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(
    found: &ServiceEndpointType,
    requested: &str,
    authorization_scheme: Option<String>,
    authorization_parameters: HashMap<String, String>,
) -> EndpointTypeState {
    let name = found.name.clone().unwrap_or_else(|| requested.to_string());
    EndpointTypeState {
        id: name.clone(),
        name,
        authorization_scheme,
        display_name: found.display_name.clone().unwrap_or_default(),
        description: found.description.clone().unwrap_or_default(),
        ui_contribution_id: found.ui_contribution_id.clone().unwrap_or_default(),
        authentication_schemes: found.scheme_names(),
        parameters: found.parameter_defaults(),
        authorization_parameters,
    }
}

#[async_trait]
impl DataSource for EndpointTypeDataSource {
    type State<'a> = State;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: 1,
            block: self
                .fields
                .to_block("Use this data source to access information about a service endpoint type."),
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Value::Value(config) = &config else {
            return Some(());
        };
        let mut config = config.clone();
        self.fields.apply_defaults(&mut config);
        match self.fields.validate(&config) {
            Ok(()) => Some(()),
            Err(e) => e.report(diags, "Invalid service endpoint type lookup"),
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let Value::Value(config) = &config else {
            return Some(config);
        };
        let result = match self.clients.get() {
            Ok(clients) => self.read_attributes(&clients, config).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(state) => Some(Value::Value(state)),
            Err(e) => e.report(diags, "Reading service endpoint type"),
        }
    }
}
