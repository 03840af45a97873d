use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// User and assistant turns are sent as context; system entries never are.
    pub fn is_conversational(self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: ModelId,
    pub name: String,
    pub description: String,
    pub color: String,
}

impl ModelInfo {
    pub fn new(id: &str, name: &str, description: &str, color: &str) -> Self {
        Self {
            id: ModelId::new(id),
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }
}

/// Ordered set of models a session may address. The first entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    models: Vec<ModelInfo>,
}

impl ModelRegistry {
    /// Entries with an empty id, and later entries that repeat an id, are dropped.
    pub fn new(models: Vec<ModelInfo>) -> Self {
        let mut unique: Vec<ModelInfo> = Vec::with_capacity(models.len());
        for model in models {
            if model.id.as_str().is_empty() {
                continue;
            }
            if !unique.iter().any(|known| known.id == model.id) {
                unique.push(model);
            }
        }
        Self { models: unique }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            ModelInfo::new("deepseek", "DeepSeek", "DeepSeek R1 Model", "blue"),
            ModelInfo::new("mistral", "Mistral", "Mistral Large", "orange"),
            ModelInfo::new("qwen", "Qwen", "Qwen Turbo", "purple"),
        ])
    }

    pub fn contains(&self, id: &ModelId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &ModelId) -> Option<&ModelInfo> {
        self.models.iter().find(|model| &model.id == id)
    }

    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModelId> {
        self.models.iter().map(|model| &model.id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelId>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
            model: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, model: ModelId) -> Self {
        Self {
            model: Some(model),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Assistant).expect("serialize"),
            "\"assistant\""
        );
        let parsed: Role = serde_json::from_str("\"system\"").expect("parse");
        assert_eq!(parsed, Role::System);
        assert!(serde_json::from_str::<Role>("\"moderator\"").is_err());
    }

    #[test]
    fn builtin_registry_lists_default_model_first() {
        let registry = ModelRegistry::builtin();
        let ids: Vec<&str> = registry.ids().map(ModelId::as_str).collect();
        assert_eq!(ids, vec!["deepseek", "mistral", "qwen"]);
        assert!(registry.contains(&ModelId::new("qwen")));
        assert!(!registry.contains(&ModelId::new("gpt-4")));
    }

    #[test]
    fn registry_drops_repeated_ids() {
        let registry = ModelRegistry::new(vec![
            ModelInfo::new("a", "A", "first", "blue"),
            ModelInfo::new("a", "A2", "second", "red"),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&ModelId::new("a")).map(|m| m.name.as_str()),
            Some("A")
        );
    }

    #[test]
    fn registry_drops_empty_ids() {
        let registry = ModelRegistry::new(vec![
            ModelInfo::new("", "Blank", "no id", "gray"),
            ModelInfo::new("qwen", "Qwen", "Qwen Turbo", "purple"),
        ]);
        let ids: Vec<&str> = registry.ids().map(ModelId::as_str).collect();
        assert_eq!(ids, vec!["qwen"]);
    }
}
