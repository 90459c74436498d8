//! Error types for rigcheck

use thiserror::Error;

/// The main error type for rigcheck operations
#[derive(Debug, Error)]
pub enum RigError {
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Duplicate source node: {0}")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Unreadable attribute kind: {0}")]
    UnreadableAttributeKind(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Duplicate object name: {0}")]
    DuplicateObject(String),

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("Invalid attribute address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value type: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Destination is driven by a connection: {0}")]
    ConnectionLocked(String),

    #[error("Scene accessor does not support batched edits")]
    BatchUnsupported,

    #[error("Batch rejected: {0}")]
    BatchRejected(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for rigcheck operations
pub type Result<T> = std::result::Result<T, RigError>;

impl RigError {
    /// True for failures that mean "the addressed slot is not there"
    /// rather than "the slot is there but something else went wrong".
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            RigError::ObjectNotFound(_) | RigError::AttributeNotFound(_)
        )
    }
}

impl From<serde_json::Error> for RigError {
    fn from(err: serde_json::Error) -> Self {
        RigError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for RigError {
    fn from(err: toml::de::Error) -> Self {
        RigError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for RigError {
    fn from(err: toml::ser::Error) -> Self {
        RigError::TomlSerError(err.to_string())
    }
}
