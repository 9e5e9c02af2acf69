use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::ServiceEndpointProjectReference;

/// Owner tag Azure DevOps expects for project-scoped service connections.
pub const OWNER_LIBRARY: &str = "library";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<EndpointAuthorization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoint_project_references: Vec<ServiceEndpointProjectReference>,
    #[serde(default, skip_serializing)]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing)]
    pub operation_status: Option<serde_json::Value>,
}

impl ServiceEndpoint {
    pub fn scheme(&self) -> Option<&str> {
        self.authorization.as_ref().map(|a| a.scheme.as_str())
    }

    /// Authorization parameter by key, if present.
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.authorization
            .as_ref()
            .and_then(|a| a.parameters.get(key))
            .map(String::as_str)
    }

    pub fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get(key))
            .map(String::as_str)
    }

    /// Project the endpoint is shared into first, which is the one that owns it.
    pub fn first_project_id(&self) -> Option<Uuid> {
        self.service_endpoint_project_references
            .first()
            .map(|r| r.project_reference.id)
    }

    /// State reported by `operationStatus.state`, e.g. "Ready" or "Failed".
    pub fn operation_state(&self) -> Option<&str> {
        self.operation_status
            .as_ref()
            .and_then(|s| s.get("state"))
            .and_then(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointAuthorization {
    pub scheme: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl EndpointAuthorization {
    pub fn new<I, K, V>(scheme: &str, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            scheme: scheme.to_string(),
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
