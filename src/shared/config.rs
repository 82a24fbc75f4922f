use std::time::Duration;

use url::Url;

use crate::client::error::{ApolloError, Result};

pub const STAGING_BASE_URL: &str = "https://api-staging.internal-aui.io/ia-controller";
pub const PRODUCTION_BASE_URL: &str = "https://azure.aui.io/api/ia-controller";
pub const STAGING_SESSION_URL: &str =
    "wss://api-staging.internal-aui.io/ia-controller/api/v1/external/session";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for an [`ApolloClient`](crate::client::ApolloClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parses and normalizes a service root. The path always ends in `/` so that
/// relative endpoint paths join underneath it instead of replacing the last
/// segment (`.../ia-controller` + `api/v1/...`).
pub fn parse_base_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ApolloError::InvalidConfig(
            "base URL must not be empty".to_string(),
        ));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| ApolloError::InvalidConfig(format!("invalid base URL '{}': {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ApolloError::InvalidConfig(format!(
                "base URL must use http or https, got '{}'",
                other
            )))
        }
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn default_user_agent() -> String {
    format!("apollo-sdk/{}", env!("CARGO_PKG_VERSION"))
}
