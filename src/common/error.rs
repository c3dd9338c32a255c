// SPDX-License-Identifier: MIT

//! Typed error handling for warp-pipe
//!
//! Missing or stale bundles are not errors: the store and the nodes resolve
//! them to defaults. These types cover the outer surfaces only (pipeline
//! scripts, node lookup, value conversion).

use thiserror::Error;

use crate::warp::bundle::{FieldKind, FieldName};

/// Top-level error type for warp-pipe
#[derive(Debug, Error)]
pub enum WarpError {
    /// Node not found in the registry
    #[error("Node '{name}' not found")]
    NodeNotFound { name: String },

    /// Unknown field name in the bundle vocabulary
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Value does not match the kind the field carries
    #[error("Field '{field}' expects {expected:?}, got {got}")]
    FieldKind {
        field: FieldName,
        expected: FieldKind,
        got: String,
    },

    /// Configuration errors (invalid CLI arguments, bad environment)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline-specific errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// A worker task panicked or was cancelled
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Pipeline-specific errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pipeline has no steps
    #[error("Pipeline '{0}' has no steps")]
    Empty(String),

    /// Two steps share an id
    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    /// A step references a step that does not run before it
    #[error("Step '{step}' references unknown or later step '{source_step}'")]
    UnknownSource { step: String, source_step: String },

    /// An Unwarp step was given direct inputs
    #[error("Step '{0}' is an Unwarp step and takes no inputs")]
    UnexpectedInputs(String),

    /// File not found when loading a pipeline
    #[error("Pipeline file not found: {0}")]
    FileNotFound(String),
}

impl WarpError {
    /// Create a node not found error
    pub fn node_not_found(name: impl Into<String>) -> Self {
        Self::NodeNotFound { name: name.into() }
    }

    /// Create a field kind mismatch error
    pub fn field_kind(field: FieldName, got: impl Into<String>) -> Self {
        Self::FieldKind {
            field,
            expected: field.kind(),
            got: got.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, WarpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_kind_message() {
        let err = WarpError::field_kind(FieldName::Seed, "text \"abc\"");
        assert_eq!(
            err.to_string(),
            "Field 'seed' expects Int, got text \"abc\""
        );
    }

    #[test]
    fn test_pipeline_error_wraps() {
        let err: WarpError = PipelineError::DuplicateStep("a".to_string()).into();
        assert_eq!(err.to_string(), "Pipeline error: Duplicate step id: a");
    }

    #[test]
    fn test_node_not_found() {
        let err = WarpError::node_not_found("Teleport");
        assert!(matches!(err, WarpError::NodeNotFound { ref name } if name == "Teleport"));
    }
}
