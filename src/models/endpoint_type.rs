use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpointType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ui_contribution_id: Option<String>,
    #[serde(default)]
    pub authentication_schemes: Vec<AuthenticationScheme>,
    #[serde(default)]
    pub input_descriptors: Vec<InputDescriptor>,
}

impl ServiceEndpointType {
    pub fn scheme_names(&self) -> Vec<String> {
        self.authentication_schemes
            .iter()
            .filter_map(|s| s.scheme.clone())
            .collect()
    }

    /// Default values keyed by input id.
    pub fn parameter_defaults(&self) -> HashMap<String, String> {
        defaults_of(&self.input_descriptors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub input_descriptors: Vec<InputDescriptor>,
}

impl AuthenticationScheme {
    pub fn parameter_defaults(&self) -> HashMap<String, String> {
        defaults_of(&self.input_descriptors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub values: Option<InputValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValues {
    #[serde(default)]
    pub default_value: Option<String>,
}

/// Envelope the Azure DevOps REST API wraps list results in.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub value: Vec<T>,
}

fn defaults_of(descriptors: &[InputDescriptor]) -> HashMap<String, String> {
    descriptors
        .iter()
        .filter_map(|d| {
            let id = d.id.clone()?;
            let default = d
                .values
                .as_ref()
                .and_then(|v| v.default_value.clone())
                .unwrap_or_default();
            Some((id, default))
        })
        .collect()
}
