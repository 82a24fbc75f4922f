use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use urlencoding::encode;

use super::error::{ApolloError, Result};
use super::types::ExternalTaskMessage;
use crate::shared::config::ClientConfig;

pub const API_KEY_HEADER: &str = "x-network-api-key";

/// Response from the raw transport: status and body text, uninterpreted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as untyped JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.body).map_err(|source| ApolloError::Decode {
            source,
            body: self.body.clone(),
        })
    }
}

pub struct ApolloClient {
    http: Client,
    base_url: Url,
}

impl ApolloClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(Self::default_headers())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Path of the "list messages for task" endpoint, relative to the base URL.
    pub fn task_messages_path(task_id: &str) -> String {
        format!("api/v1/external/tasks/{}/messages", encode(task_id))
    }

    /// Get all messages recorded for a task.
    ///
    /// A body that is valid JSON of the wrong shape fails with
    /// [`ApolloError::Validation`].
    pub async fn get_task_messages(
        &self,
        task_id: &str,
        api_key: &str,
    ) -> Result<Vec<ExternalTaskMessage>> {
        let response = self
            .send_raw(
                Method::GET,
                &Self::task_messages_path(task_id),
                Self::api_key_headers(api_key)?,
            )
            .await?;

        if !response.is_success() {
            return Err(ApolloError::Http {
                status: response.status,
                body: response.body,
            });
        }

        parse_typed(response.body)
    }

    /// Issue a request through the underlying transport without any response
    /// handling. Non-success statuses are returned, not raised.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
    ) -> Result<RawResponse> {
        let url = self.base_url.join(path.trim_start_matches('/')).map_err(|e| {
            ApolloError::InvalidInput(format!("cannot build URL for '{}': {}", path, e))
        })?;

        debug!(%method, %url, "sending request");

        let response = self
            .http
            .request(method, url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "received response");

        Ok(RawResponse { status, body })
    }

    pub fn api_key_headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(api_key)
            .map_err(|_| ApolloError::InvalidInput("API key is not a valid header value".to_string()))?;
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        Ok(headers)
    }
}

/// Deserializes a response body into `T`, splitting shape mismatches from
/// malformed JSON.
pub fn parse_typed<T: DeserializeOwned>(body: String) -> Result<T> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(source) => Err(ApolloError::from_body(source, body)),
    }
}
