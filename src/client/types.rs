use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message recorded on an external task.
///
/// Fields the service adds beyond the declared schema are kept in `extra` so a
/// record serializes back with everything the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTaskMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Value>,
    #[serde(default)]
    pub cards: Vec<ProductCard>,
    #[serde(default)]
    pub followup_suggestions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<CardParameter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named product attribute. The schema declares `value` as a string; some
/// message kinds send structured values instead, which is what the
/// message fetcher's repair step exists for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardParameter {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
