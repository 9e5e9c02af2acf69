use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

static ORGANIZATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$").unwrap());

/// Value checks attached to string attributes.
#[derive(Debug, Clone)]
pub enum Validator {
    NotEmpty,
    NotWhitespace,
    HttpUrl,
    NoTrailingSlash,
    OrganizationName,
    OneOf(Vec<&'static str>),
}

impl Validator {
    pub fn check(&self, path: &str, value: &str) -> Result<(), String> {
        match self {
            Validator::NotEmpty => {
                if value.is_empty() {
                    return Err(format!("{path}: must not be empty"));
                }
            }
            Validator::NotWhitespace => {
                if value.trim().is_empty() {
                    return Err(format!("{path}: must not be empty or whitespace"));
                }
            }
            Validator::HttpUrl => check_http_url(path, value)?,
            Validator::NoTrailingSlash => {
                if value.ends_with('/') {
                    return Err(format!("{path}: must not end with a slash, got {value}"));
                }
            }
            Validator::OrganizationName => {
                if !ORGANIZATION_NAME.is_match(value) {
                    return Err(format!(
                        "{path}: {value:?} is not a valid organization name"
                    ));
                }
            }
            Validator::OneOf(allowed) => {
                if !allowed.contains(&value) {
                    return Err(format!(
                        "{path}: expected one of [{}], got {value}",
                        allowed.join(", ")
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_http_url(path: &str, value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("{path}: {value:?} is not a valid url: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "{path}: expected url scheme to be http or https, got {}",
            url.scheme()
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("{path}: url {value:?} has no host"));
    }
    Ok(())
}
