use crate::types::{Language, MessageCategory};
use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Required variable '{name}' is missing and has no default")]
    MissingVariable { name: String },

    #[error("No active template available for category {category:?} / language {language:?}")]
    NoTemplateAvailable {
        category: MessageCategory,
        language: Language,
    },

    #[error("Experiment error: {0}")]
    Experiment(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
