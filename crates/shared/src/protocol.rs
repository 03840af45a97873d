use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Message, ModelId, Role};

pub fn chat_route() -> &'static str {
    "/chat"
}

pub fn chat_all_route() -> &'static str {
    "/chatAll"
}

pub fn models_route() -> &'static str {
    "/models"
}

/// The `{role, content}` projection of a history entry sent as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: ModelId,
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiChatRequest {
    pub models: Vec<ModelId>,
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub session_id: String,
    pub model: ModelId,
    pub reply: String,
}

/// Aggregate `/chatAll` reply. Per-model values are left opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiChatResponse {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub responses: BTreeMap<ModelId, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatPayload {
    Single(ChatRequest),
    Multi(MultiChatRequest),
}

impl ChatPayload {
    pub fn route(&self) -> &'static str {
        match self {
            ChatPayload::Single(_) => chat_route(),
            ChatPayload::Multi(_) => chat_all_route(),
        }
    }

    pub fn messages(&self) -> &[WireMessage] {
        match self {
            ChatPayload::Single(request) => &request.messages,
            ChatPayload::Multi(request) => &request.messages,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            ChatPayload::Single(request) => request.session_id.as_deref(),
            ChatPayload::Multi(request) => request.session_id.as_deref(),
        }
    }

    pub fn models(&self) -> Vec<ModelId> {
        match self {
            ChatPayload::Single(request) => vec![request.model.clone()],
            ChatPayload::Multi(request) => request.models.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Single(ChatResponse),
    Multi(MultiChatResponse),
}

impl ChatReply {
    pub fn session_id(&self) -> &str {
        match self {
            ChatReply::Single(response) => &response.session_id,
            ChatReply::Multi(response) => &response.session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_payload_serializes_to_chat_body() {
        let payload = ChatPayload::Single(ChatRequest {
            model: ModelId::new("deepseek"),
            messages: vec![WireMessage::new(Role::User, "Hello")],
            session_id: Some("sess_abc".to_string()),
        });
        assert_eq!(payload.route(), "/chat");
        assert_eq!(
            serde_json::to_value(&payload).expect("serialize"),
            json!({
                "model": "deepseek",
                "messages": [{"role": "user", "content": "Hello"}],
                "session_id": "sess_abc"
            })
        );
    }

    #[test]
    fn multi_payload_omits_missing_session_id() {
        let payload = ChatPayload::Multi(MultiChatRequest {
            models: vec![ModelId::new("qwen"), ModelId::new("mistral")],
            messages: vec![WireMessage::new(Role::User, "hi")],
            session_id: None,
        });
        assert_eq!(payload.route(), "/chatAll");
        assert_eq!(
            serde_json::to_value(&payload).expect("serialize"),
            json!({
                "models": ["qwen", "mistral"],
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn multi_response_keeps_per_model_values_opaque() {
        let parsed: MultiChatResponse = serde_json::from_value(json!({
            "session_id": "sess_1",
            "responses": {
                "qwen": {"reply": "hello"},
                "mistral": {"error": "Unsupported model"}
            }
        }))
        .expect("parse");
        assert_eq!(parsed.responses.len(), 2);
        assert_eq!(
            parsed.responses[&ModelId::new("mistral")]["error"],
            json!("Unsupported model")
        );
    }
}
