use std::fmt;

use shared::domain::ModelId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure cause of a send cycle or registry fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("invalid request: {}", join_issues(.0))]
    Validation(Vec<FieldIssue>),
    #[error("{status}: {message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
}

impl ChatError {
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Validation(_) => "validation",
            ChatError::Api { .. } => "api",
            ChatError::Transport(_) => "transport",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown model '{0}'")]
    InvalidModel(ModelId),
    #[error("model '{0}' is selected more than once")]
    DuplicateModel(ModelId),
    #[error("at least {min} model(s) must be selected")]
    TooFewModels { min: usize },
    #[error("at most {max} model(s) may be selected")]
    TooManyModels { max: usize },
    #[error("invalid selection policy: min={min} max={max}")]
    InvalidPolicy { min: usize, max: usize },
}
