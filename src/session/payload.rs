use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message sent by the user over the external session socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessage {
    pub task_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamingUpdate {
    pub channel: StreamChannel,
    pub data: Value,
    #[serde(default)]
    pub scope: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamChannel {
    #[serde(default)]
    pub event_name: Option<String>,
}

impl StreamingUpdate {
    pub fn text_chunk(&self) -> Option<&str> {
        self.data.get("text").and_then(Value::as_str)
    }

    pub fn context(&self) -> Option<&Value> {
        self.scope.as_ref().and_then(|scope| scope.get("context"))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FinalMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub sender: Value,
    pub receiver: Value,
    #[serde(default)]
    pub cards: Vec<Value>,
    #[serde(default)]
    pub followup_suggestions: Vec<String>,
}

/// An incoming socket frame, classified by the keys it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Streaming(StreamingUpdate),
    Final(FinalMessage),
    Error { error: Value, raw: Value },
    Unknown(Value),
}

impl SessionEvent {
    pub fn classify(raw: Value) -> Self {
        let Some(map) = raw.as_object() else {
            return SessionEvent::Unknown(raw);
        };

        if map.contains_key("channel") && map.contains_key("data") {
            if let Ok(update) = serde_json::from_value(raw.clone()) {
                return SessionEvent::Streaming(update);
            }
        } else if map.contains_key("text") && map.contains_key("sender") && map.contains_key("receiver") {
            if let Ok(message) = serde_json::from_value(raw.clone()) {
                return SessionEvent::Final(message);
            }
        } else if let Some(error) = map.get("error") {
            return SessionEvent::Error {
                error: error.clone(),
                raw: raw.clone(),
            };
        }

        SessionEvent::Unknown(raw)
    }

    /// Text frames that are not JSON are reported as unknown strings.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(value) => Self::classify(value),
            Err(_) => SessionEvent::Unknown(Value::String(text.to_string())),
        }
    }
}
