use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub org_service_url: String,
    pub personal_access_token: String,
    pub api_version: String,
    pub http_timeout: Duration,
    pub ready_poll_interval: Duration,
    pub log_level: String,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::resolve(None, None)
    }

    /// Values from the provider block win over the environment.
    pub fn resolve(
        org_service_url: Option<String>,
        personal_access_token: Option<String>,
    ) -> Result<Self, String> {
        let org_service_url = match non_blank(org_service_url) {
            Some(url) => url,
            None => env_required("AZDO_ORG_SERVICE_URL")?,
        };
        let personal_access_token = match non_blank(personal_access_token) {
            Some(token) => token,
            None => env_required("AZDO_PERSONAL_ACCESS_TOKEN")?,
        };

        reqwest::Url::parse(&org_service_url)
            .map_err(|e| format!("Invalid org_service_url: {e}"))?;

        let api_version = env_or("AZDO_API_VERSION", "7.1");

        let http_timeout: u64 = env_or("AZDO_HTTP_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid AZDO_HTTP_TIMEOUT_SECS: {e}"))?;

        let ready_poll_interval: u64 = env_or("AZDO_READY_POLL_INTERVAL_SECS", "10")
            .parse()
            .map_err(|e| format!("Invalid AZDO_READY_POLL_INTERVAL_SECS: {e}"))?;

        Ok(ProviderConfig {
            org_service_url: org_service_url.trim_end_matches('/').to_string(),
            personal_access_token,
            api_version,
            http_timeout: Duration::from_secs(http_timeout),
            ready_poll_interval: Duration::from_secs(ready_poll_interval),
            log_level: log_level(),
        })
    }
}

/// Log filter used when `RUST_LOG` is not set. Read before the provider is
/// configured, since logging starts first.
pub fn log_level() -> String {
    env_or("AZDO_LOG_LEVEL", "info")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_required(key: &str) -> Result<String, String> {
    non_blank(std::env::var(key).ok())
        .ok_or_else(|| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
