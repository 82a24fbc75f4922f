//! Task message retrieval with a recovery path for mis-typed `value` fields.
//!
//! The typed endpoint rejects messages whose card parameters carry a
//! structured `value`. When that happens the same request is replayed through
//! the raw transport, the payload is repaired with
//! [`repair::stringify_value_fields`], and parsed again into the same types.

pub mod repair;

use reqwest::Method;
use tracing::{debug, info, warn};

use crate::client::api::parse_typed;
use crate::client::{ApolloClient, ApolloError, ExternalTaskMessage, Result};
use crate::shared::config::ClientConfig;

/// Which request produced the messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    /// The typed call succeeded as-is.
    Primary,
    /// The typed call failed validation and the raw payload was repaired.
    Repaired,
}

#[derive(Debug, Clone)]
pub struct FetchedMessages {
    pub messages: Vec<ExternalTaskMessage>,
    pub path: FetchPath,
}

/// Fetch the messages of `task_id` from the service at `base_url`.
pub async fn fetch_messages(
    base_url: &str,
    api_key: &str,
    task_id: &str,
) -> Result<Vec<ExternalTaskMessage>> {
    let client = ApolloClient::new(ClientConfig::new(base_url)?)?;
    Ok(fetch_task_messages(&client, api_key, task_id).await?.messages)
}

/// Fetch the messages of `task_id`, falling back to a repaired raw request
/// when the typed response fails schema validation.
pub async fn fetch_task_messages(
    client: &ApolloClient,
    api_key: &str,
    task_id: &str,
) -> Result<FetchedMessages> {
    if api_key.trim().is_empty() {
        return Err(ApolloError::InvalidInput("API key is required".to_string()));
    }
    if task_id.trim().is_empty() {
        return Err(ApolloError::InvalidInput("task id is required".to_string()));
    }

    match client.get_task_messages(task_id, api_key).await {
        Ok(messages) => {
            debug!(task_id, count = messages.len(), "typed request succeeded");
            Ok(FetchedMessages {
                messages,
                path: FetchPath::Primary,
            })
        }
        Err(ApolloError::Validation { source, .. }) => {
            warn!(task_id, error = %source, "response failed validation, retrying with raw transport");
            let messages = fetch_repaired(client, api_key, task_id).await?;
            info!(task_id, count = messages.len(), "recovered messages after value field repair");
            Ok(FetchedMessages {
                messages,
                path: FetchPath::Repaired,
            })
        }
        Err(e) => Err(e),
    }
}

async fn fetch_repaired(
    client: &ApolloClient,
    api_key: &str,
    task_id: &str,
) -> Result<Vec<ExternalTaskMessage>> {
    let response = client
        .send_raw(
            Method::GET,
            &ApolloClient::task_messages_path(task_id),
            ApolloClient::api_key_headers(api_key)?,
        )
        .await?;

    if !response.is_success() {
        return Err(ApolloError::Http {
            status: response.status,
            body: response.body,
        });
    }

    let repaired = repair::stringify_value_fields(response.json()?)?;
    // Same target type as the typed call
    parse_typed(serde_json::to_string(&repaired)?)
}
