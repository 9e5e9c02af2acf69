use std::time::Duration;

#[derive(Debug)]
pub enum ProviderError {
    Validation(String),
    Config(String),
    Import(String),
    NotFound(String),
    Unauthorized(String),
    Conflict(String),
    Api { status: u16, message: String },
    Http(reqwest::Error),
    Decode(String),
    UnsupportedScheme { resource: String, scheme: String },
    Catalog(String),
    Provisioning(String),
    Timeout { operation: String, after: Duration },
    Operation {
        context: String,
        source: Box<ProviderError>,
    },
}

impl ProviderError {
    /// Wrap this error with the operation that produced it.
    pub fn context(self, context: impl Into<String>) -> Self {
        ProviderError::Operation {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Record this error for Terraform and give up on the current call.
    pub fn report<T>(self, diags: &mut tf_provider::Diagnostics, summary: &str) -> Option<T> {
        tracing::error!("{summary}: {self}");
        diags.root_error(summary.to_string(), self.to_string());
        None
    }

    /// True when the upstream API reported the entity as missing, at any wrapping depth.
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::NotFound(_) => true,
            ProviderError::Api { status, .. } => *status == 404,
            ProviderError::Http(err) => err.status().is_some_and(|s| s.as_u16() == 404),
            ProviderError::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Validation(msg) => write!(f, "Invalid configuration: {msg}"),
            ProviderError::Config(msg) => write!(f, "Provider configuration error: {msg}"),
            ProviderError::Import(msg) => write!(f, "Import failed: {msg}"),
            ProviderError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            ProviderError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ProviderError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            ProviderError::Api { status, message } => {
                write!(f, "Azure DevOps API error ({status}): {message}")
            }
            ProviderError::Http(err) => write!(f, "HTTP error: {err}"),
            ProviderError::Decode(msg) => write!(f, "Decode error: {msg}"),
            ProviderError::UnsupportedScheme { resource, scheme } => write!(
                f,
                "inconsistent authorization scheme for {resource}: {scheme} is not supported"
            ),
            ProviderError::Catalog(msg) => write!(f, "querying service endpoint types: {msg}"),
            ProviderError::Provisioning(msg) => write!(f, "Service endpoint provisioning failed: {msg}"),
            ProviderError::Timeout { operation, after } => {
                write!(f, "{operation} timed out after {}s", after.as_secs())
            }
            ProviderError::Operation { context, source } => write!(f, "{context}: {source}"),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProviderError::Http(err) => Some(err),
            ProviderError::Operation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err)
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}
