//! Session state: message history, model selection, session id and the pending flag.
//!
//! `SessionStore` is the only writer of history and session id. Everything else
//! goes through the operations below.

use shared::domain::{Message, ModelId, ModelRegistry};
use chrono::Utc;
use uuid::Uuid;

use crate::error::SelectionError;

pub const SESSION_START_NOTICE: &str =
    "Chat session started. Context will be preserved across model switches.";

const SESSION_ID_PREFIX: &str = "sess_";
const SESSION_ID_SUFFIX_LEN: usize = 9;

pub fn generate_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{SESSION_ID_PREFIX}{}", &suffix[..SESSION_ID_SUFFIX_LEN])
}

/// Bounds on how many models a send may address at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    min: usize,
    max: usize,
}

impl SelectionPolicy {
    pub const SINGLE: Self = Self { min: 1, max: 1 };

    pub fn new(min: usize, max: usize) -> Result<Self, SelectionError> {
        if min == 0 || min > max {
            return Err(SelectionError::InvalidPolicy { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    fn check_count(&self, count: usize) -> Result<(), SelectionError> {
        if count < self.min {
            return Err(SelectionError::TooFewModels { min: self.min });
        }
        if count > self.max {
            return Err(SelectionError::TooManyModels { max: self.max });
        }
        Ok(())
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::SINGLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub messages: Vec<Message>,
    pub selected_models: Vec<ModelId>,
    pub pending: bool,
}

impl SessionSnapshot {
    pub fn selected_model(&self) -> Option<&ModelId> {
        self.selected_models.first()
    }
}

#[derive(Debug)]
pub struct SessionStore {
    id: String,
    messages: Vec<Message>,
    registry: ModelRegistry,
    policy: SelectionPolicy,
    selected: Vec<ModelId>,
    pending: bool,
    live: bool,
}

impl SessionStore {
    pub fn new(registry: ModelRegistry, policy: SelectionPolicy) -> Result<Self, SelectionError> {
        Self::seeded(generate_session_id(), registry, policy)
    }

    /// Seeds a session with a caller-chosen id. An empty id is replaced with a fresh one.
    pub fn seeded(
        id: impl Into<String>,
        registry: ModelRegistry,
        policy: SelectionPolicy,
    ) -> Result<Self, SelectionError> {
        let selected: Vec<ModelId> = registry.ids().take(policy.min()).cloned().collect();
        policy.check_count(selected.len())?;

        let id = id.into();
        let mut store = Self {
            id: if id.is_empty() {
                generate_session_id()
            } else {
                id
            },
            messages: Vec::new(),
            registry,
            policy,
            selected,
            pending: false,
            live: true,
        };
        store.append(Message::system(SESSION_START_NOTICE));
        Ok(store)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn selected_models(&self) -> &[ModelId] {
        &self.selected
    }

    /// Primary selection. Never empty while the policy minimum is at least one.
    pub fn selected_model(&self) -> &ModelId {
        &self.selected[0]
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            messages: self.messages.clone(),
            selected_models: self.selected.clone(),
            pending: self.pending,
        }
    }

    /// Appends to the tail and stamps the entry; returns the new length.
    pub fn append(&mut self, mut message: Message) -> usize {
        message.timestamp = Some(Utc::now());
        self.messages.push(message);
        self.messages.len()
    }

    pub fn set_model(&mut self, id: ModelId) -> Result<(), SelectionError> {
        self.set_models(vec![id])
    }

    pub fn set_models(&mut self, ids: Vec<ModelId>) -> Result<(), SelectionError> {
        for (index, id) in ids.iter().enumerate() {
            if !self.registry.contains(id) {
                return Err(SelectionError::InvalidModel(id.clone()));
            }
            if ids[..index].contains(id) {
                return Err(SelectionError::DuplicateModel(id.clone()));
            }
        }
        self.policy.check_count(ids.len())?;
        self.selected = ids;
        Ok(())
    }

    /// Adds `id` to the selection, or removes it when already selected.
    /// With a single-model policy an unselected model replaces the current one.
    pub fn toggle_model(&mut self, id: ModelId) -> Result<(), SelectionError> {
        if !self.registry.contains(&id) {
            return Err(SelectionError::InvalidModel(id));
        }

        let mut next = self.selected.clone();
        if let Some(position) = next.iter().position(|selected| selected == &id) {
            next.remove(position);
        } else if self.policy.max() == 1 {
            next = vec![id];
        } else {
            next.push(id);
        }
        self.set_models(next)
    }

    /// Returns true when the flag changed.
    pub fn begin_pending(&mut self) -> bool {
        let changed = !self.pending;
        self.pending = true;
        changed
    }

    /// Returns true when the flag changed.
    pub fn end_pending(&mut self) -> bool {
        let changed = self.pending;
        self.pending = false;
        changed
    }

    /// Adopts a backend-issued id. Empty or unchanged ids are ignored.
    pub fn adopt_session_id(&mut self, id: &str) -> bool {
        if id.is_empty() || id == self.id {
            return false;
        }
        self.id = id.to_string();
        true
    }

    pub fn replace_registry(&mut self, registry: ModelRegistry) -> Result<(), SelectionError> {
        let mut next: Vec<ModelId> = self
            .selected
            .iter()
            .filter(|id| registry.contains(id))
            .cloned()
            .collect();
        for id in registry.ids() {
            if next.len() >= self.policy.min() {
                break;
            }
            if !next.contains(id) {
                next.push(id.clone());
            }
        }
        self.policy.check_count(next.len())?;

        self.registry = registry;
        self.selected = next;
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        self.live = false;
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
