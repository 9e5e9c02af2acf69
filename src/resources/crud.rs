use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use super::base::{EndpointConfig, ServiceEndpointResource};
use super::plan::{self, PlannedChange};
use super::EndpointResource;
use crate::error::ProviderError;
use crate::models::ServiceEndpoint;
use crate::schema::{value, Attributes, Fields};
use crate::state::Clients;

const GITHUB_TYPE: &str = "github";
const INSTALLATION_TOKEN: &str = "InstallationToken";

async fn within<T, F>(operation: &str, after: Duration, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| ProviderError::Timeout {
            operation: operation.to_string(),
            after,
        })?
}

fn is_github_app(endpoint: &ServiceEndpoint) -> bool {
    endpoint
        .endpoint_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(GITHUB_TYPE))
        && endpoint
            .scheme()
            .is_some_and(|s| s.eq_ignore_ascii_case(INSTALLATION_TOKEN))
}

fn endpoint_ids<C: EndpointConfig>(config: &C) -> Result<(Uuid, Uuid), ProviderError> {
    let base = config.base();
    let id = base
        .id
        .ok_or_else(|| ProviderError::Validation("service endpoint id is not set".to_string()))?;
    Ok((id, base.project_id))
}

/// Split `<project id or name>/<endpoint uuid>`.
pub fn parse_import_id(import_id: &str) -> Result<(&str, Uuid), ProviderError> {
    let (project, endpoint) = import_id
        .split_once('/')
        .filter(|(p, e)| !p.is_empty() && !e.is_empty() && !e.contains('/'))
        .ok_or_else(|| {
            ProviderError::Import(format!(
                "unexpected format of ID ({import_id}), expected projectid/resourceId"
            ))
        })?;

    let endpoint_id = Uuid::parse_str(endpoint)
        .map_err(|_| ProviderError::Import(format!("{endpoint} isn't a valid UUID")))?;

    Ok((project, endpoint_id))
}

impl<C: EndpointConfig> ServiceEndpointResource<C> {
    pub async fn create(&self, clients: &Clients, config: C) -> Result<C, ProviderError> {
        within("create", self.timeouts.create, self.create_inner(clients, config)).await
    }

    async fn create_inner(&self, clients: &Clients, mut config: C) -> Result<C, ProviderError> {
        let endpoint = self
            .expand(&config)
            .map_err(|e| e.context("reading terraform configuration"))?;

        if is_github_app(&endpoint) {
            return Err(ProviderError::Validation(
                "GitHub Apps must be created on GitHub and then can be imported".to_string(),
            ));
        }

        let created = clients
            .service_endpoints
            .create_service_endpoint(&endpoint)
            .await
            .map_err(|e| e.context("creating service endpoint in Azure DevOps"))?;

        let id = created.id.ok_or_else(|| {
            ProviderError::Decode("created service endpoint has no id".to_string())
        })?;
        tracing::info!("Created {} service endpoint {id}", self.type_name);

        let project_id = config.base().project_id;
        self.wait_ready(clients, project_id, id).await?;

        config.base_mut().id = Some(id);
        self.read_inner(clients, config).await?.ok_or_else(|| {
            ProviderError::NotFound(format!(
                "service endpoint {id} was not found right after it was created"
            ))
        })
    }

    /// Poll until the endpoint reports ready, bounded by the create timeout.
    async fn wait_ready(
        &self,
        clients: &Clients,
        project_id: Uuid,
        id: Uuid,
    ) -> Result<(), ProviderError> {
        loop {
            let current = clients
                .service_endpoints
                .get_service_endpoint_details(project_id, id)
                .await
                .map_err(|e| e.context(format!("waiting for service endpoint {id} to be ready")))?;

            if let Some(endpoint) = current {
                if endpoint
                    .operation_state()
                    .is_some_and(|s| s.eq_ignore_ascii_case("Failed"))
                {
                    let detail = endpoint
                        .operation_status
                        .as_ref()
                        .and_then(|s| s.get("statusMessage"))
                        .and_then(Value::as_str)
                        .unwrap_or("no status message");
                    return Err(ProviderError::Provisioning(format!(
                        "service endpoint {id} failed to become ready: {detail}"
                    )));
                }
                if endpoint.is_ready.unwrap_or(true) {
                    return Ok(());
                }
            }

            tracing::debug!("Service endpoint {id} not ready yet, polling again");
            tokio::time::sleep(clients.ready_poll_interval).await;
        }
    }

    /// Refresh state from the API. `Ok(None)` means the endpoint is gone.
    pub async fn read(&self, clients: &Clients, state: C) -> Result<Option<C>, ProviderError> {
        within("read", self.timeouts.read, self.read_inner(clients, state)).await
    }

    async fn read_inner(&self, clients: &Clients, mut state: C) -> Result<Option<C>, ProviderError> {
        let (id, project_id) = endpoint_ids(&state)?;

        let endpoint = match clients
            .service_endpoints
            .get_service_endpoint_details(project_id, id)
            .await
        {
            Ok(Some(endpoint)) if endpoint.id.is_some() => endpoint,
            Ok(_) => {
                tracing::info!("Service endpoint {id} no longer exists, removing from state");
                return Ok(None);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Service endpoint {id} not found, removing from state");
                return Ok(None);
            }
            Err(e) => {
                return Err(e.context(format!(
                    "looking up service endpoint given ID ({id}) and project ID ({project_id})"
                )));
            }
        };

        self.flatten(&mut state, &endpoint)?;
        Ok(Some(state))
    }

    pub async fn update(&self, clients: &Clients, config: C) -> Result<C, ProviderError> {
        within("update", self.timeouts.update, self.update_inner(clients, config)).await
    }

    async fn update_inner(&self, clients: &Clients, mut config: C) -> Result<C, ProviderError> {
        let endpoint = self
            .expand(&config)
            .map_err(|e| e.context("reading terraform configuration"))?;
        let (id, _) = endpoint_ids(&config)?;

        if is_github_app(&endpoint) {
            return Err(ProviderError::Validation(
                "GitHub Apps can not be updated, configuration must match imported values exactly"
                    .to_string(),
            ));
        }

        let updated = clients
            .service_endpoints
            .update_service_endpoint(id, &endpoint)
            .await
            .map_err(|e| e.context("updating service endpoint in Azure DevOps"))?;
        tracing::info!("Updated {} service endpoint {id}", self.type_name);

        self.flatten(&mut config, &updated)?;
        self.read_inner(clients, config).await?.ok_or_else(|| {
            ProviderError::NotFound(format!("service endpoint {id} disappeared during update"))
        })
    }

    pub async fn delete(&self, clients: &Clients, state: &C) -> Result<(), ProviderError> {
        within("delete", self.timeouts.delete, self.delete_inner(clients, state)).await
    }

    async fn delete_inner(&self, clients: &Clients, state: &C) -> Result<(), ProviderError> {
        let (id, project_id) = endpoint_ids(state)?;

        match clients
            .service_endpoints
            .delete_service_endpoint(id, &[project_id])
            .await
        {
            Ok(()) => {
                tracing::info!("Deleted {} service endpoint {id}", self.type_name);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("Service endpoint {id} was already deleted");
                Ok(())
            }
            Err(e) => Err(e.context("deleting service endpoint in Azure DevOps")),
        }
    }

    /// Import `<project id or name>/<endpoint uuid>`.
    pub async fn import(&self, clients: &Clients, import_id: &str) -> Result<C, ProviderError> {
        within("import", self.timeouts.read, self.import_inner(clients, import_id)).await
    }

    async fn import_inner(&self, clients: &Clients, import_id: &str) -> Result<C, ProviderError> {
        let (project, id) = parse_import_id(import_id)?;

        let project_id = match Uuid::parse_str(project) {
            Ok(project_id) => project_id,
            Err(_) => clients
                .service_endpoints
                .get_project_id(project)
                .await
                .map_err(|e| {
                    e.context(format!(
                        "getting the project with specified projectNameOrID: {project}"
                    ))
                })?,
        };

        let seed: C = serde_json::from_value(json!({
            "id": id,
            "project_id": project_id,
        }))?;

        self.read_inner(clients, seed).await?.ok_or_else(|| {
            ProviderError::Import(format!(
                "service endpoint {id} not found in project {project_id}"
            ))
        })
    }

    /// Typed configuration from planned attributes, checked against the fields.
    fn decode_config(&self, planned: &Attributes) -> Result<C, ProviderError> {
        let mut planned = planned.clone();
        self.fields.apply_defaults(&mut planned);
        self.fields.validate(&planned)?;
        serde_json::from_value(value::attributes_to_json(&planned))
            .map_err(|e| ProviderError::Validation(e.to_string()))
    }

    fn decode_state(&self, state: &Attributes) -> Result<C, ProviderError> {
        serde_json::from_value(value::attributes_to_json(state)).map_err(ProviderError::from)
    }

    /// Attributes for `config`, with empty strings left unset where `reference`
    /// had them unset.
    fn encode(&self, config: &C, reference: &Attributes) -> Result<Attributes, ProviderError> {
        let mut attrs = value::attributes_from_json(serde_json::to_value(config)?);
        self.fields.complete(&mut attrs);
        self.fields.reconcile(reference, &mut attrs);
        Ok(attrs)
    }
}

#[async_trait]
impl<C: EndpointConfig> EndpointResource for ServiceEndpointResource<C> {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn validate(&self, config: &Attributes) -> Result<(), ProviderError> {
        let mut config = config.clone();
        self.fields.apply_defaults(&mut config);
        self.fields.validate(&config)
    }

    fn plan(
        &self,
        prior: Option<&Attributes>,
        config: &Attributes,
    ) -> Result<PlannedChange, ProviderError> {
        plan::plan(&self.fields, prior, config)
    }

    async fn create(&self, clients: &Clients, planned: Attributes) -> Result<Attributes, ProviderError> {
        let config = self.decode_config(&planned)?;
        let created = ServiceEndpointResource::create(self, clients, config).await?;
        self.encode(&created, &planned)
    }

    async fn read(
        &self,
        clients: &Clients,
        state: Attributes,
    ) -> Result<Option<Attributes>, ProviderError> {
        let typed = self.decode_state(&state)?;
        match ServiceEndpointResource::read(self, clients, typed).await? {
            Some(current) => self.encode(&current, &state).map(Some),
            None => Ok(None),
        }
    }

    async fn update(&self, clients: &Clients, planned: Attributes) -> Result<Attributes, ProviderError> {
        let config = self.decode_config(&planned)?;
        let updated = ServiceEndpointResource::update(self, clients, config).await?;
        self.encode(&updated, &planned)
    }

    async fn delete(&self, clients: &Clients, state: Attributes) -> Result<(), ProviderError> {
        let typed = self.decode_state(&state)?;
        ServiceEndpointResource::delete(self, clients, &typed).await
    }

    async fn import(&self, clients: &Clients, import_id: &str) -> Result<Attributes, ProviderError> {
        let imported = ServiceEndpointResource::import(self, clients, import_id).await?;
        self.encode(&imported, &Attributes::new())
    }
}
