//! User-visible rendering of send failures.

use shared::domain::Message;

use crate::error::ChatError;

pub const NOTIFICATION_TITLE: &str = "Error";
pub const NOTIFICATION_DESCRIPTION: &str = "Failed to send message. Please try again.";

/// Ephemeral toast shown alongside the inline history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub detail: String,
}

pub fn failure_entry(error: &ChatError) -> Message {
    Message::system(format!("Error: {error}"))
}

pub fn failure_notification(error: &ChatError) -> Notification {
    Notification {
        title: NOTIFICATION_TITLE.to_string(),
        description: NOTIFICATION_DESCRIPTION.to_string(),
        detail: error.to_string(),
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> ChatError {
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_decode() {
        format!("malformed response body: {err}")
    } else {
        format!("network failure: {err}")
    };
    ChatError::Transport(message)
}

pub fn malformed_body(err: &serde_json::Error) -> ChatError {
    ChatError::Transport(format!("malformed response body: {err}"))
}
