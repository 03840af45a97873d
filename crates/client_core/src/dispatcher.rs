//! Builds and validates outbound payloads and applies the optimistic user turn.

use std::fmt;

use shared::{
    domain::{Message, ModelId, ModelRegistry, Role},
    protocol::{ChatPayload, ChatRequest, MultiChatRequest, WireMessage},
};

use crate::{
    error::{ChatError, FieldIssue},
    store::SessionStore,
};

/// Why a send was dropped without touching history or the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyContent,
    AlreadyPending,
    SessionClosed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::EmptyContent => "empty content",
            Rejection::AlreadyPending => "a request is already pending",
            Rejection::SessionClosed => "session closed",
        };
        f.write_str(text)
    }
}

/// An accepted send: the user turn is already in history and the session is pending.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub payload: ChatPayload,
    /// Local validation outcome; an error here must never reach the network.
    pub validation: Result<(), ChatError>,
}

impl Dispatch {
    pub fn models(&self) -> Vec<ModelId> {
        self.payload.models()
    }
}

/// Projects user/assistant history to wire form and appends the new user turn.
pub fn build_context(history: &[Message], content: &str) -> Vec<WireMessage> {
    history
        .iter()
        .filter(|message| message.role.is_conversational())
        .map(WireMessage::from)
        .chain(std::iter::once(WireMessage::new(Role::User, content)))
        .collect()
}

pub fn build_payload(
    models: &[ModelId],
    messages: Vec<WireMessage>,
    session_id: &str,
) -> ChatPayload {
    let session_id = Some(session_id.to_string());
    match models {
        [model] => ChatPayload::Single(ChatRequest {
            model: model.clone(),
            messages,
            session_id,
        }),
        _ => ChatPayload::Multi(MultiChatRequest {
            models: models.to_vec(),
            messages,
            session_id,
        }),
    }
}

pub fn validate(payload: &ChatPayload, registry: &ModelRegistry) -> Result<(), ChatError> {
    let mut issues = Vec::new();

    match payload {
        ChatPayload::Single(request) => check_model("model", &request.model, registry, &mut issues),
        ChatPayload::Multi(request) => {
            if request.models.is_empty() {
                issues.push(FieldIssue::new("models", "must not be empty"));
            }
            for (index, model) in request.models.iter().enumerate() {
                let field = format!("models[{index}]");
                check_model(&field, model, registry, &mut issues);
                if request.models[..index].contains(model) {
                    issues.push(FieldIssue::new(field, format!("duplicate model '{model}'")));
                }
            }
        }
    }

    match payload.messages().last() {
        None => issues.push(FieldIssue::new("messages", "must not be empty")),
        Some(last) if last.role != Role::User => issues.push(FieldIssue::new(
            "messages",
            format!("last entry must be a user turn, got {}", last.role),
        )),
        Some(last) if last.content.trim().is_empty() => {
            issues.push(FieldIssue::new("messages", "last entry must have content"))
        }
        Some(_) => {}
    }

    if payload.session_id().is_some_and(str::is_empty) {
        issues.push(FieldIssue::new("session_id", "must not be empty when present"));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ChatError::Validation(issues))
    }
}

fn check_model(
    field: &str,
    model: &ModelId,
    registry: &ModelRegistry,
    issues: &mut Vec<FieldIssue>,
) {
    if model.as_str().is_empty() {
        issues.push(FieldIssue::new(field, "must not be empty"));
    } else if !registry.contains(model) {
        issues.push(FieldIssue::new(field, format!("unknown model '{model}'")));
    }
}

/// Accepts a send: builds context from existing history, then appends the user
/// turn and marks the session pending. Rejections leave the store untouched.
pub fn prepare(store: &mut SessionStore, content: &str) -> Result<Dispatch, Rejection> {
    if !store.is_live() {
        return Err(Rejection::SessionClosed);
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(Rejection::EmptyContent);
    }
    if store.is_pending() {
        return Err(Rejection::AlreadyPending);
    }

    let context = build_context(store.messages(), content);
    store.append(Message::user(content));
    store.begin_pending();

    let payload = build_payload(store.selected_models(), context, store.id());
    let validation = validate(&payload, store.registry());
    Ok(Dispatch {
        payload,
        validation,
    })
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
