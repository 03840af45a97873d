//! Commits the outcome of a send cycle back into the session store.

use shared::{
    domain::{Message, ModelId},
    protocol::{ChatReply, MultiChatResponse},
};
use serde_json::Value;

use crate::{error::ChatError, recovery, store::SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Index of the first entry appended by this reconciliation.
    pub first_appended: usize,
    pub adopted_session_id: bool,
}

pub fn reconcile(
    store: &mut SessionStore,
    requested: &[ModelId],
    outcome: &Result<ChatReply, ChatError>,
) -> Reconciled {
    let first_appended = store.messages().len();
    store.end_pending();

    let adopted_session_id = match outcome {
        Ok(reply) => {
            match reply {
                ChatReply::Single(response) => {
                    store.append(Message::assistant(
                        response.reply.clone(),
                        response.model.clone(),
                    ));
                }
                ChatReply::Multi(response) => append_aggregate(store, requested, response),
            }
            store.adopt_session_id(reply.session_id())
        }
        Err(error) => {
            store.append(recovery::failure_entry(error));
            false
        }
    };

    Reconciled {
        first_appended,
        adopted_session_id,
    }
}

fn append_aggregate(store: &mut SessionStore, requested: &[ModelId], response: &MultiChatResponse) {
    for model in requested {
        match response.responses.get(model) {
            Some(value) => append_model_value(store, model, value),
            None => {
                store.append(Message::system(format!("No reply from {model}")));
            }
        }
    }

    for (model, value) in &response.responses {
        if !requested.contains(model) {
            append_model_value(store, model, value);
        }
    }
}

fn append_model_value(store: &mut SessionStore, model: &ModelId, value: &Value) {
    if let Some(reply) = value.get("reply").and_then(Value::as_str) {
        store.append(Message::assistant(reply, model.clone()));
        return;
    }

    let error = match value.get("error") {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => value.to_string(),
    };
    store.append(Message::system(format!("Error from {model}: {error}")));
}
