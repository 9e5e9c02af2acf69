use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

use azdo_serviceendpoints::client::{HttpClient, ServiceEndpointClient};
use azdo_serviceendpoints::config::ProviderConfig;
use azdo_serviceendpoints::error::ProviderError;
use azdo_serviceendpoints::models::{
    EndpointAuthorization, ProjectReference, ServiceEndpoint, ServiceEndpointProjectReference,
};

const PAT: &str = "test-pat";
/// base64 of ":test-pat"
const BASIC_AUTH: &str = "Basic OnRlc3QtcGF0";

const PROJECT_ID: &str = "6a2b8c1e-5d4f-4e3a-9b7c-1d2e3f4a5b6c";
const ENDPOINT_ID: &str = "0c9f1e2d-3b4a-4c5d-8e6f-7a8b9c0d1e2f";
const VANISHED_ID: &str = "11111111-2222-4333-8444-555555555555";
const MISSING_ID: &str = "99999999-8888-4777-8666-555555555555";
const BROKEN_ID: &str = "deadbeef-0000-4000-8000-000000000000";

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    query: String,
    authorization: String,
    body: String,
}

type Log = Arc<Mutex<Vec<Seen>>>;

struct FakeAzdo {
    addr: SocketAddr,
    client: HttpClient,
    log: Log,
}

impl FakeAzdo {
    fn requests(&self) -> Vec<Seen> {
        self.log.lock().unwrap().clone()
    }

    fn last(&self) -> Seen {
        self.requests().pop().expect("no request reached the fake API")
    }
}

async fn spawn_fake() -> FakeAzdo {
    let log: Log = Arc::default();
    let app = Router::new().fallback(fake_azdo).with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let config = ProviderConfig {
        org_service_url: format!("http://{addr}/contoso"),
        personal_access_token: PAT.to_string(),
        api_version: "7.1".to_string(),
        http_timeout: Duration::from_secs(5),
        ready_poll_interval: Duration::from_millis(5),
        log_level: "warn".to_string(),
    };

    FakeAzdo {
        addr,
        client: HttpClient::new(&config).unwrap(),
        log,
    }
}

fn json_response(status: StatusCode, body: Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

fn stored_endpoint(id: &str) -> Value {
    json!({
        "id": id,
        "name": "UNIT_TEST_CONN_NAME",
        "type": "github",
        "url": "https://github.com",
        "owner": "library",
        "description": "UNIT_TEST_CONN_DESCRIPTION",
        "authorization": { "scheme": "Token", "parameters": {} },
        "serviceEndpointProjectReferences": [{
            "projectReference": { "id": PROJECT_ID, "name": "Contoso" },
            "name": "UNIT_TEST_CONN_NAME",
            "description": "UNIT_TEST_CONN_DESCRIPTION",
        }],
        "isReady": true,
        "operationStatus": { "state": "Ready", "statusMessage": "" },
    })
}

/// Just enough of the Azure DevOps REST surface to exercise the client.
async fn fake_azdo(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    log.lock().unwrap().push(Seen {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        body: body.clone(),
    });

    let segments: Vec<&str> = uri.path().trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("POST", ["contoso", "_apis", "serviceendpoint", "endpoints"]) => {
            let mut endpoint: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            endpoint["id"] = json!(ENDPOINT_ID);
            endpoint["isReady"] = json!(false);
            json_response(StatusCode::OK, endpoint)
        }
        ("GET", ["contoso", _, "_apis", "serviceendpoint", "endpoints", id]) => match *id {
            VANISHED_ID => (StatusCode::OK, String::new()).into_response(),
            MISSING_ID => json_response(
                StatusCode::NOT_FOUND,
                json!({ "message": "Service connection not found", "typeKey": "ServiceEndpointNotFoundException" }),
            ),
            BROKEN_ID => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
            id => json_response(StatusCode::OK, stored_endpoint(id)),
        },
        ("PUT", ["contoso", "_apis", "serviceendpoint", "endpoints", _]) => {
            let endpoint: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            json_response(StatusCode::OK, endpoint)
        }
        ("DELETE", ["contoso", "_apis", "serviceendpoint", "endpoints", id]) => {
            if *id == MISSING_ID {
                json_response(StatusCode::NOT_FOUND, json!({ "message": "already gone" }))
            } else {
                StatusCode::NO_CONTENT.into_response()
            }
        }
        ("GET", ["contoso", "_apis", "serviceendpoint", "types"]) => json_response(
            StatusCode::OK,
            json!({
                "count": 1,
                "value": [{
                    "name": "dockerregistry",
                    "displayName": "Docker Registry",
                    "authenticationSchemes": [{
                        "scheme": "UsernamePassword",
                        "inputDescriptors": [
                            { "id": "registry", "values": { "defaultValue": "https://index.docker.io/v1/" } },
                            { "id": "password" },
                        ],
                    }],
                    "inputDescriptors": [
                        { "id": "registrytype", "values": { "defaultValue": "DockerHub" } },
                    ],
                }],
            }),
        ),
        ("GET", ["contoso", "_apis", "projects", "Contoso"]) => json_response(
            StatusCode::OK,
            json!({ "id": PROJECT_ID, "name": "Contoso", "state": "wellFormed" }),
        ),
        ("GET", ["contoso", "_apis", "projects", "Secret"]) => json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "message": "TF400813: not authorized" }),
        ),
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({ "message": format!("no route for {}", uri.path()) }),
        ),
    }
}

fn new_endpoint() -> ServiceEndpoint {
    ServiceEndpoint {
        name: Some("UNIT_TEST_CONN_NAME".to_string()),
        owner: Some("library".to_string()),
        endpoint_type: Some("dockerregistry".to_string()),
        url: Some("https://hub.docker.com/".to_string()),
        description: Some("Managed by Terraform".to_string()),
        authorization: Some(EndpointAuthorization::new(
            "UsernamePassword",
            [("username", "user"), ("password", "pass")],
        )),
        service_endpoint_project_references: vec![ServiceEndpointProjectReference {
            project_reference: ProjectReference {
                id: Uuid::parse_str(PROJECT_ID).unwrap(),
                name: None,
            },
            name: Some("UNIT_TEST_CONN_NAME".to_string()),
            description: Some("Managed by Terraform".to_string()),
        }],
        ..Default::default()
    }
}

fn id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap()
}

// ── Endpoints ───────────────────────────────────────────────────

#[tokio::test]
async fn create_posts_camel_case_body_with_pat() {
    let fake = spawn_fake().await;

    let created = fake
        .client
        .create_service_endpoint(&new_endpoint())
        .await
        .unwrap();
    assert_eq!(created.id, Some(id(ENDPOINT_ID)));
    assert_eq!(created.is_ready, Some(false));

    let seen = fake.last();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path, "/contoso/_apis/serviceendpoint/endpoints");
    assert_eq!(seen.query, "api-version=7.1");
    assert_eq!(seen.authorization, BASIC_AUTH);

    let body: Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body["type"], "dockerregistry");
    assert_eq!(body["owner"], "library");
    assert_eq!(body["authorization"]["scheme"], "UsernamePassword");
    assert_eq!(
        body["serviceEndpointProjectReferences"][0]["projectReference"]["id"],
        PROJECT_ID
    );
    assert!(body.get("id").is_none());
    assert!(body.get("isReady").is_none());
}

#[tokio::test]
async fn get_reads_endpoint_in_project() {
    let fake = spawn_fake().await;

    let endpoint = fake
        .client
        .get_service_endpoint_details(id(PROJECT_ID), id(ENDPOINT_ID))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(endpoint.id, Some(id(ENDPOINT_ID)));
    assert_eq!(endpoint.endpoint_type.as_deref(), Some("github"));
    assert_eq!(endpoint.scheme(), Some("Token"));
    assert_eq!(endpoint.first_project_id(), Some(id(PROJECT_ID)));
    assert_eq!(endpoint.operation_state(), Some("Ready"));
    assert_eq!(endpoint.is_ready, Some(true));

    let seen = fake.last();
    assert_eq!(
        seen.path,
        format!("/contoso/{PROJECT_ID}/_apis/serviceendpoint/endpoints/{ENDPOINT_ID}")
    );
}

#[tokio::test]
async fn get_empty_body_means_gone() {
    let fake = spawn_fake().await;

    let endpoint = fake
        .client
        .get_service_endpoint_details(id(PROJECT_ID), id(VANISHED_ID))
        .await
        .unwrap();
    assert!(endpoint.is_none());
}

#[tokio::test]
async fn get_404_is_not_found_with_api_message() {
    let fake = spawn_fake().await;

    let err = fake
        .client
        .get_service_endpoint_details(id(PROJECT_ID), id(MISSING_ID))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        ProviderError::NotFound(msg) => assert_eq!(msg, "Service connection not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn plain_text_error_body_is_kept() {
    let fake = spawn_fake().await;

    let err = fake
        .client
        .get_service_endpoint_details(id(PROJECT_ID), id(BROKEN_ID))
        .await
        .unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_puts_to_org_level_endpoint() {
    let fake = spawn_fake().await;
    let mut endpoint = new_endpoint();
    endpoint.id = Some(id(ENDPOINT_ID));
    endpoint.description = Some("changed".to_string());

    let updated = fake
        .client
        .update_service_endpoint(id(ENDPOINT_ID), &endpoint)
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("changed"));

    let seen = fake.last();
    assert_eq!(seen.method, "PUT");
    assert_eq!(
        seen.path,
        format!("/contoso/_apis/serviceendpoint/endpoints/{ENDPOINT_ID}")
    );
    assert_eq!(seen.authorization, BASIC_AUTH);
}

#[tokio::test]
async fn delete_sends_project_ids() {
    let fake = spawn_fake().await;

    fake.client
        .delete_service_endpoint(id(ENDPOINT_ID), &[id(PROJECT_ID)])
        .await
        .unwrap();

    let seen = fake.last();
    assert_eq!(seen.method, "DELETE");
    assert_eq!(seen.query, format!("projectIds={PROJECT_ID}&api-version=7.1"));

    let err = fake
        .client
        .delete_service_endpoint(id(MISSING_ID), &[id(PROJECT_ID)])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── Types & projects ────────────────────────────────────────────

#[tokio::test]
async fn types_unwraps_list_envelope() {
    let fake = spawn_fake().await;

    let types = fake.client.get_service_endpoint_types().await.unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name.as_deref(), Some("dockerregistry"));
    assert_eq!(types[0].scheme_names(), vec!["UsernamePassword"]);
    assert_eq!(types[0].parameter_defaults()["registrytype"], "DockerHub");
    assert_eq!(
        types[0].authentication_schemes[0].parameter_defaults()["password"],
        ""
    );
}

#[tokio::test]
async fn project_lookup_by_name() {
    let fake = spawn_fake().await;

    let project_id = fake.client.get_project_id("Contoso").await.unwrap();
    assert_eq!(project_id, id(PROJECT_ID));

    let err = fake.client.get_project_id("Nowhere").await.unwrap_err();
    assert!(err.is_not_found());

    let err = fake.client.get_project_id("Secret").await.unwrap_err();
    assert!(matches!(err, ProviderError::Unauthorized(_)), "{err:?}");
    assert!(err.to_string().contains("TF400813"));
}

#[tokio::test]
async fn trailing_slash_on_org_url_is_tolerated() {
    let fake = spawn_fake().await;
    let config = ProviderConfig {
        org_service_url: format!("http://{}/contoso/", fake.addr),
        personal_access_token: PAT.to_string(),
        api_version: "7.1".to_string(),
        http_timeout: Duration::from_secs(5),
        ready_poll_interval: Duration::from_millis(5),
        log_level: "warn".to_string(),
    };
    let client = HttpClient::new(&config).unwrap();

    client.get_service_endpoint_types().await.unwrap();
    assert_eq!(fake.last().path, "/contoso/_apis/serviceendpoint/types");
}
