#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use azdo_serviceendpoints::client::ServiceEndpointClient;
use azdo_serviceendpoints::error::ProviderError;
use azdo_serviceendpoints::models::{
    AuthenticationScheme, EndpointAuthorization, InputDescriptor, InputValues, ProjectReference,
    ServiceEndpoint, ServiceEndpointProjectReference, ServiceEndpointType,
};
use azdo_serviceendpoints::resources::{
    argocd, docker_registry, github, github_enterprise, jenkins, maven, run_pipeline, sonarqube,
    EndpointResource, PlannedChange,
};
use azdo_serviceendpoints::schema::{value, Attributes};
use azdo_serviceendpoints::state::{Clients, ClientsHandle};

pub const CONN_NAME: &str = "UNIT_TEST_CONN_NAME";
pub const CONN_DESCRIPTION: &str = "UNIT_TEST_CONN_DESCRIPTION";

/// Parameters Azure DevOps treats as confidential and blanks on read.
const CONFIDENTIAL: &[&str] = &["password", "apitoken", "AccessToken"];

/// In-memory stand-in for the Azure DevOps service endpoint API.
pub struct MockClient {
    store: Mutex<HashMap<Uuid, ServiceEndpoint>>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ProviderError>>,
    types: Vec<ServiceEndpointType>,
    types_fetches: AtomicUsize,
    types_delay: Duration,
    projects: HashMap<String, Uuid>,
    pending_polls: AtomicUsize,
    failed_provisioning: Mutex<bool>,
    mask_secrets: bool,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            types: catalog_types(),
            types_fetches: AtomicUsize::new(0),
            types_delay: Duration::ZERO,
            projects: HashMap::new(),
            pending_polls: AtomicUsize::new(0),
            failed_provisioning: Mutex::new(false),
            mask_secrets: true,
        }
    }

    pub fn with_types(mut self, types: Vec<ServiceEndpointType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_types_delay(mut self, delay: Duration) -> Self {
        self.types_delay = delay;
        self
    }

    pub fn with_project(mut self, name: &str, id: Uuid) -> Self {
        self.projects.insert(name.to_string(), id);
        self
    }

    pub fn without_secret_masking(mut self) -> Self {
        self.mask_secrets = false;
        self
    }

    /// Created endpoints report `isReady: false` for the next `polls` reads.
    pub fn with_pending_polls(self, polls: usize) -> Self {
        self.pending_polls.store(polls, Ordering::SeqCst);
        self
    }

    pub fn with_failed_provisioning(self) -> Self {
        *self.failed_provisioning.lock().unwrap() = true;
        self
    }

    /// Make `method` return an upstream error with `message`.
    pub fn fail(&self, method: &'static str, message: &str) {
        self.fail_with(
            method,
            ProviderError::Api {
                status: 500,
                message: message.to_string(),
            },
        );
    }

    pub fn fail_with(&self, method: &'static str, error: ProviderError) {
        self.failures.lock().unwrap().insert(method, error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| *c == method).count()
    }

    pub fn types_fetches(&self) -> usize {
        self.types_fetches.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: Uuid) -> Option<ServiceEndpoint> {
        self.store.lock().unwrap().get(&id).cloned()
    }

    pub fn insert(&self, endpoint: ServiceEndpoint) {
        let id = endpoint.id.expect("stored endpoint needs an id");
        self.store.lock().unwrap().insert(id, endpoint);
    }

    pub fn remove(&self, id: Uuid) {
        self.store.lock().unwrap().remove(&id);
    }

    fn record(&self, method: &str) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(method.to_string());
        match self.failures.lock().unwrap().remove(method) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn masked(&self, mut endpoint: ServiceEndpoint) -> ServiceEndpoint {
        if self.mask_secrets {
            if let Some(auth) = endpoint.authorization.as_mut() {
                for key in CONFIDENTIAL {
                    auth.parameters.remove(*key);
                }
            }
        }
        endpoint
    }
}

#[async_trait]
impl ServiceEndpointClient for MockClient {
    async fn create_service_endpoint(
        &self,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError> {
        self.record("create")?;
        let mut created = endpoint.clone();
        let id = Uuid::now_v7();
        created.id = Some(id);
        created.is_ready = Some(true);
        self.store.lock().unwrap().insert(id, created.clone());
        Ok(self.masked(created))
    }

    async fn get_service_endpoint_details(
        &self,
        project_id: Uuid,
        endpoint_id: Uuid,
    ) -> Result<Option<ServiceEndpoint>, ProviderError> {
        self.record("get")?;
        let Some(mut endpoint) = self.stored(endpoint_id) else {
            return Ok(None);
        };
        if endpoint.first_project_id() != Some(project_id) {
            return Err(ProviderError::NotFound(format!(
                "service endpoint {endpoint_id} is not shared with project {project_id}"
            )));
        }

        if *self.failed_provisioning.lock().unwrap() {
            endpoint.is_ready = Some(false);
            endpoint.operation_status = Some(json!({
                "state": "Failed",
                "statusMessage": "registry rejected the credentials",
            }));
        } else if self
            .pending_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            endpoint.is_ready = Some(false);
            endpoint.operation_status = Some(json!({ "state": "InProgress" }));
        }
        Ok(Some(self.masked(endpoint)))
    }

    async fn update_service_endpoint(
        &self,
        endpoint_id: Uuid,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError> {
        self.record("update")?;
        let mut store = self.store.lock().unwrap();
        if !store.contains_key(&endpoint_id) {
            return Err(ProviderError::NotFound(format!(
                "service endpoint {endpoint_id} does not exist"
            )));
        }
        let mut updated = endpoint.clone();
        updated.id = Some(endpoint_id);
        updated.is_ready = Some(true);
        store.insert(endpoint_id, updated.clone());
        drop(store);
        Ok(self.masked(updated))
    }

    async fn delete_service_endpoint(
        &self,
        endpoint_id: Uuid,
        _project_ids: &[Uuid],
    ) -> Result<(), ProviderError> {
        self.record("delete")?;
        match self.store.lock().unwrap().remove(&endpoint_id) {
            Some(_) => Ok(()),
            None => Err(ProviderError::NotFound(format!(
                "service endpoint {endpoint_id} does not exist"
            ))),
        }
    }

    async fn get_service_endpoint_types(&self) -> Result<Vec<ServiceEndpointType>, ProviderError> {
        self.types_fetches.fetch_add(1, Ordering::SeqCst);
        if !self.types_delay.is_zero() {
            tokio::time::sleep(self.types_delay).await;
        }
        self.record("types")?;
        Ok(self.types.clone())
    }

    async fn get_project_id(&self, name_or_id: &str) -> Result<Uuid, ProviderError> {
        self.record("project")?;
        self.projects.get(name_or_id).copied().ok_or_else(|| {
            ProviderError::NotFound(format!("project {name_or_id} does not exist"))
        })
    }
}

/// Clients around `mock`, polling for readiness every few milliseconds.
pub fn clients(mock: &Arc<MockClient>) -> Clients {
    Clients::new(mock.clone()).with_ready_poll_interval(Duration::from_millis(5))
}

pub fn mock() -> Arc<MockClient> {
    Arc::new(MockClient::new())
}

/// A configured handle around `mock`, as Terraform leaves it after configure.
pub fn handle(mock: &Arc<MockClient>) -> ClientsHandle {
    ClientsHandle::new(Arc::new(clients(mock)))
}

pub fn attrs(json: Value) -> Attributes {
    value::attributes_from_json(json)
}

pub fn json_of(attrs: &Attributes) -> Value {
    value::attributes_to_json(attrs)
}

/// A resource driven with JSON documents the way Terraform drives it: plan
/// first, then apply the planned state.
#[derive(Clone)]
pub struct Endpoint(pub Arc<dyn EndpointResource>);

impl Endpoint {
    pub fn plan(&self, prior: Option<&Value>, config: Value) -> Result<PlannedChange, ProviderError> {
        let prior = prior.cloned().map(attrs);
        self.0.plan(prior.as_ref(), &attrs(config))
    }

    pub async fn create(&self, clients: &Clients, config: Value) -> Result<Value, ProviderError> {
        let planned = self.plan(None, config)?;
        let state = self.0.create(clients, planned.state).await?;
        Ok(json_of(&state))
    }

    pub async fn read(&self, clients: &Clients, state: Value) -> Result<Option<Value>, ProviderError> {
        let read = self.0.read(clients, attrs(state)).await?;
        Ok(read.as_ref().map(json_of))
    }

    pub async fn update(
        &self,
        clients: &Clients,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let planned = self.plan(Some(&prior), config)?;
        let state = self.0.update(clients, planned.state).await?;
        Ok(json_of(&state))
    }

    pub async fn delete(&self, clients: &Clients, state: Value) -> Result<(), ProviderError> {
        self.0.delete(clients, attrs(state)).await
    }

    pub async fn import(&self, clients: &Clients, import_id: &str) -> Result<Value, ProviderError> {
        let state = self.0.import(clients, import_id).await?;
        Ok(json_of(&state))
    }
}

pub fn resource(name: &str) -> Endpoint {
    let r: Arc<dyn EndpointResource> = match name {
        argocd::RESOURCE_NAME => Arc::new(argocd::resource()),
        docker_registry::RESOURCE_NAME => Arc::new(docker_registry::resource()),
        github::RESOURCE_NAME => Arc::new(github::resource()),
        github_enterprise::RESOURCE_NAME => Arc::new(github_enterprise::resource()),
        jenkins::RESOURCE_NAME => Arc::new(jenkins::resource()),
        maven::RESOURCE_NAME => Arc::new(maven::resource()),
        run_pipeline::RESOURCE_NAME => Arc::new(run_pipeline::resource()),
        sonarqube::RESOURCE_NAME => Arc::new(sonarqube::resource()),
        other => panic!("{other} is not a service endpoint resource"),
    };
    Endpoint(r)
}

/// An endpoint as the API would describe it, with the base fields filled in.
pub fn descriptor(
    endpoint_type: &str,
    url: &str,
    authorization: EndpointAuthorization,
    data: Option<HashMap<String, String>>,
) -> ServiceEndpoint {
    let project_id = Uuid::now_v7();
    ServiceEndpoint {
        id: Some(Uuid::now_v7()),
        name: Some(CONN_NAME.to_string()),
        owner: Some("library".to_string()),
        endpoint_type: Some(endpoint_type.to_string()),
        url: Some(url.to_string()),
        description: Some(CONN_DESCRIPTION.to_string()),
        authorization: Some(authorization),
        data,
        service_endpoint_project_references: vec![ServiceEndpointProjectReference {
            project_reference: ProjectReference {
                id: project_id,
                name: None,
            },
            name: Some(CONN_NAME.to_string()),
            description: Some(CONN_DESCRIPTION.to_string()),
        }],
        is_ready: None,
        operation_status: None,
    }
}

pub fn data(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// A minimal valid configuration for every resource, keyed by resource name.
pub fn valid_configs(project_id: Uuid) -> Vec<(&'static str, Value)> {
    let base = |extra: Value| {
        let mut config = json!({
            "project_id": project_id.to_string(),
            "service_endpoint_name": CONN_NAME,
            "description": CONN_DESCRIPTION,
        });
        if let (Some(config), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            config.extend(extra.clone());
        }
        config
    };

    vec![
        (
            "azuredevops_serviceendpoint_argocd",
            base(json!({
                "url": "https://www.argocd.com",
                "authentication_token": [{ "token": "argocd-token" }],
            })),
        ),
        (
            "azuredevops_serviceendpoint_dockerregistry",
            base(json!({
                "docker_registry": "https://index.docker.io/v1/",
                "docker_username": "dockeruser",
                "docker_password": "dockerpass",
                "docker_email": "docker@example.com",
                "registry_type": "DockerHub",
            })),
        ),
        (
            "azuredevops_serviceendpoint_github",
            base(json!({
                "auth_personal": [{ "personal_access_token": "github-pat" }],
            })),
        ),
        (
            "azuredevops_serviceendpoint_github_enterprise",
            base(json!({
                "url": "https://github.contoso.com",
                "auth_personal": [{ "personal_access_token": "ghe-pat" }],
            })),
        ),
        (
            "azuredevops_serviceendpoint_jenkins",
            base(json!({
                "url": "https://www.jenkins.com",
                "username": "jenkins",
                "password": "jenkins-pass",
            })),
        ),
        (
            "azuredevops_serviceendpoint_maven",
            base(json!({
                "url": "https://maven.example.com",
                "repository_id": "central",
                "authentication_basic": [{ "username": "maven", "password": "maven-pass" }],
            })),
        ),
        (
            "azuredevops_serviceendpoint_sonarqube",
            base(json!({
                "url": "https://www.sonarqube.com/",
                "token": "sonar-token",
            })),
        ),
        (
            "azuredevops_serviceendpoint_runpipeline",
            base(json!({
                "organization_name": "example",
                "auth_personal": [{ "personal_access_token": "azdo-pat" }],
            })),
        ),
    ]
}

fn input(id: &str, default: Option<&str>) -> InputDescriptor {
    InputDescriptor {
        id: Some(id.to_string()),
        values: default.map(|d| InputValues {
            default_value: Some(d.to_string()),
        }),
    }
}

fn scheme(name: &str, inputs: Vec<InputDescriptor>) -> AuthenticationScheme {
    AuthenticationScheme {
        scheme: Some(name.to_string()),
        display_name: Some(name.to_string()),
        input_descriptors: inputs,
    }
}

fn endpoint_type(
    name: &str,
    display_name: &str,
    schemes: Vec<AuthenticationScheme>,
    inputs: Vec<InputDescriptor>,
) -> ServiceEndpointType {
    ServiceEndpointType {
        name: Some(name.to_string()),
        display_name: Some(display_name.to_string()),
        description: Some(format!("{display_name} service connection")),
        ui_contribution_id: Some(format!("ms.vss-endpoint.{name}")),
        authentication_schemes: schemes,
        input_descriptors: inputs,
    }
}

/// The endpoint types the provider manages, as the catalog API lists them.
pub fn catalog_types() -> Vec<ServiceEndpointType> {
    vec![
        endpoint_type(
            "github",
            "GitHub",
            vec![
                scheme("OAuth", vec![input("ConfigurationId", None)]),
                scheme("Token", vec![input("AccessToken", None)]),
                scheme("InstallationToken", vec![input("IdToken", None)]),
            ],
            vec![],
        ),
        endpoint_type(
            "githubenterprise",
            "GitHub Enterprise Server",
            vec![
                scheme("Token", vec![input("apitoken", None)]),
                scheme("OAuth2", vec![input("ConfigurationId", None)]),
            ],
            vec![input("acceptUntrustedCerts", Some("false"))],
        ),
        endpoint_type(
            "sonarqube",
            "SonarQube",
            vec![scheme("UsernamePassword", vec![input("username", None)])],
            vec![],
        ),
        endpoint_type(
            "jenkins",
            "Jenkins",
            vec![scheme(
                "UsernamePassword",
                vec![input("username", None), input("password", None)],
            )],
            vec![input("AcceptUntrustedCerts", Some("false"))],
        ),
        endpoint_type(
            "dockerregistry",
            "Docker Registry",
            vec![scheme(
                "UsernamePassword",
                vec![
                    input("registry", Some("https://index.docker.io/v1/")),
                    input("username", None),
                    input("password", None),
                    input("email", None),
                ],
            )],
            vec![input("registrytype", Some("DockerHub"))],
        ),
        endpoint_type(
            "externalmavenrepository",
            "Maven",
            vec![
                scheme(
                    "UsernamePassword",
                    vec![input("username", None), input("password", None)],
                ),
                scheme("Token", vec![input("apitoken", None)]),
            ],
            vec![input("RepositoryId", None)],
        ),
        endpoint_type(
            "argocd",
            "ArgoCD",
            vec![
                scheme(
                    "UsernamePassword",
                    vec![input("username", None), input("password", None)],
                ),
                scheme("Token", vec![input("apitoken", None)]),
            ],
            vec![],
        ),
        endpoint_type(
            "azdoapi",
            "Azure DevOps API",
            vec![scheme("Token", vec![input("apitoken", None)])],
            vec![input("releaseUrl", None)],
        ),
    ]
}
