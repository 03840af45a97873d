use serde::Deserialize;
use serde_json::Value;

/// Error body shapes emitted by the inference backend and its proxy:
/// `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}` or `{"error": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            match detail {
                Value::String(text) if !text.trim().is_empty() => {
                    return Some(text.trim().to_string())
                }
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(Value::as_str))
                        .collect::<Vec<_>>()
                        .join("; ");
                    if !joined.is_empty() {
                        return Some(joined);
                    }
                }
                Value::Null => {}
                other => return Some(other.to_string()),
            }
        }

        self.error
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}

/// Best-effort human message for a non-success response body.
pub fn error_message_from_body(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message() {
            return Some(message);
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
