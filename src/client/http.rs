use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::ServiceEndpointClient;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::{ListResponse, Project, ServiceEndpoint, ServiceEndpointType};

/// reqwest-backed client for `{org}/_apis/serviceendpoint`, authenticated with a PAT.
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    api_version: String,
    personal_access_token: String,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("azdo-serviceendpoints/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.org_service_url)
            .map_err(|e| ProviderError::Config(format!("invalid organization url: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_version: config.api_version.clone(),
            personal_access_token: config.personal_access_token.clone(),
        })
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Config("organization url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("api-version", &self.api_version);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.personal_access_token))
            .header("Accept", "application/json")
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ProviderError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

#[async_trait]
impl ServiceEndpointClient for HttpClient {
    async fn create_service_endpoint(
        &self,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError> {
        let url = self.url(&["_apis", "serviceendpoint", "endpoints"], &[])?;
        tracing::debug!("POST {url}");
        let resp = self.send(self.request(Method::POST, url).json(endpoint)).await?;
        decode(resp).await
    }

    async fn get_service_endpoint_details(
        &self,
        project_id: Uuid,
        endpoint_id: Uuid,
    ) -> Result<Option<ServiceEndpoint>, ProviderError> {
        let project = project_id.to_string();
        let id = endpoint_id.to_string();
        let url = self.url(
            &[&project, "_apis", "serviceendpoint", "endpoints", &id],
            &[],
        )?;
        tracing::debug!("GET {url}");
        let resp = self.send(self.request(Method::GET, url)).await?;
        decode_optional(resp).await
    }

    async fn update_service_endpoint(
        &self,
        endpoint_id: Uuid,
        endpoint: &ServiceEndpoint,
    ) -> Result<ServiceEndpoint, ProviderError> {
        let id = endpoint_id.to_string();
        let url = self.url(&["_apis", "serviceendpoint", "endpoints", &id], &[])?;
        tracing::debug!("PUT {url}");
        let resp = self.send(self.request(Method::PUT, url).json(endpoint)).await?;
        decode(resp).await
    }

    async fn delete_service_endpoint(
        &self,
        endpoint_id: Uuid,
        project_ids: &[Uuid],
    ) -> Result<(), ProviderError> {
        let id = endpoint_id.to_string();
        let projects = project_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.url(
            &["_apis", "serviceendpoint", "endpoints", &id],
            &[("projectIds", &projects)],
        )?;
        tracing::debug!("DELETE {url}");
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    async fn get_service_endpoint_types(&self) -> Result<Vec<ServiceEndpointType>, ProviderError> {
        let url = self.url(&["_apis", "serviceendpoint", "types"], &[])?;
        tracing::debug!("GET {url}");
        let resp = self.send(self.request(Method::GET, url)).await?;
        let list: ListResponse<ServiceEndpointType> = decode(resp).await?;
        Ok(list.value)
    }

    async fn get_project_id(&self, name_or_id: &str) -> Result<Uuid, ProviderError> {
        let url = self.url(&["_apis", "projects", name_or_id], &[])?;
        tracing::debug!("GET {url}");
        let resp = self.send(self.request(Method::GET, url)).await?;
        let project: Project = decode(resp).await?;
        Ok(project.id)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ProviderError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(ProviderError::from)
}

async fn decode_optional<T: DeserializeOwned>(resp: Response) -> Result<Option<T>, ProviderError> {
    let body = resp.text().await?;
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some).map_err(ProviderError::from)
}

fn error_for_status(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(1024).collect());

    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Unauthorized(message),
        StatusCode::CONFLICT => ProviderError::Conflict(message),
        _ => ProviderError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
