//! Terraform plugin surface of the service endpoint resources.

use async_trait::async_trait;
use tf_provider::Resource;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{AttributePath, Diagnostics};

use super::base::{EndpointConfig, ServiceEndpointResource};
use super::EndpointResource;
use crate::error::ProviderError;
use crate::schema::{Attributes, State, Value};

pub const SCHEMA_VERSION: i64 = 1;

fn known(state: State, what: &str) -> Result<Attributes, ProviderError> {
    match state {
        Value::Value(attrs) => Ok(attrs),
        Value::Null => Err(ProviderError::Validation(format!("{what} is null"))),
        Value::Unknown => Err(ProviderError::Validation(format!("{what} is not known yet"))),
    }
}

#[async_trait]
impl<C: EndpointConfig> Resource for ServiceEndpointResource<C> {
    type State<'a> = State;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(Schema {
            version: SCHEMA_VERSION,
            block: self.fields.to_block("Manages an Azure DevOps service endpoint."),
        })
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Value::Value(config) = &config else {
            return Some(());
        };
        match EndpointResource::validate(self, config) {
            Ok(()) => Some(()),
            Err(e) => e.report(diags, "Invalid service endpoint configuration"),
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let attrs = match state {
            Value::Value(attrs) => attrs,
            other => return Some((other, private_state)),
        };
        let clients = match self.clients.get() {
            Ok(clients) => clients,
            Err(e) => return e.report(diags, "Reading service endpoint"),
        };

        match EndpointResource::read(self, &clients, attrs).await {
            Ok(Some(current)) => Some((Value::Value(current), private_state)),
            Ok(None) => Some((Value::Null, private_state)),
            Err(e) => e.report(diags, "Reading service endpoint"),
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Value::Value(config) = &config_state else {
            return Some((proposed_state, ValueEmpty::default()));
        };

        match EndpointResource::plan(self, None, config) {
            Ok(change) => Some((Value::Value(change.state), ValueEmpty::default())),
            Err(e) => e.report(diags, "Planning service endpoint"),
        }
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let (Value::Value(prior), Value::Value(config)) = (&prior_state, &config_state) else {
            return Some((proposed_state, prior_private_state, Vec::new()));
        };

        match EndpointResource::plan(self, Some(prior), config) {
            Ok(change) => {
                if !change.requires_replace.is_empty() {
                    tracing::info!(
                        "{} must be replaced, changed: {}",
                        self.type_name,
                        change.requires_replace.join(", ")
                    );
                }
                let replace = change
                    .requires_replace
                    .iter()
                    .map(|name| AttributePath::new(name.clone()))
                    .collect();
                Some((Value::Value(change.state), prior_private_state, replace))
            }
            Err(e) => e.report(diags, "Planning service endpoint"),
        }
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let result = match (self.clients.get(), known(planned_state, "planned state")) {
            (Ok(clients), Ok(planned)) => EndpointResource::create(self, &clients, planned).await,
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        match result {
            Ok(state) => Some((Value::Value(state), planned_private_state)),
            Err(e) => e.report(diags, "Creating service endpoint"),
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let result = match (self.clients.get(), known(planned_state, "planned state")) {
            (Ok(clients), Ok(planned)) => EndpointResource::update(self, &clients, planned).await,
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        match result {
            Ok(state) => Some((Value::Value(state), planned_private_state)),
            Err(e) => e.report(diags, "Updating service endpoint"),
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let result = match (self.clients.get(), known(prior_state, "prior state")) {
            (Ok(clients), Ok(prior)) => EndpointResource::delete(self, &clients, prior).await,
            (Err(e), _) | (_, Err(e)) => Err(e),
        };
        match result {
            Ok(()) => Some(()),
            Err(e) => e.report(diags, "Deleting service endpoint"),
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let result = match self.clients.get() {
            Ok(clients) => EndpointResource::import(self, &clients, &id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(state) => Some((Value::Value(state), ValueEmpty::default())),
            Err(e) => e.report(diags, "Importing service endpoint"),
        }
    }
}
