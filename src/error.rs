//! Error types for the mapping layer
//!
//! Absence (an unknown id, an untracked entity) is never an error here; it is
//! reported as `None` or `false`. The variants below describe configuration
//! and metadata defects that callers are not expected to recover from.

use crate::graph::TypeName;
use thiserror::Error;

/// Errors that can occur while maintaining a mapping context
#[derive(Error, Debug)]
pub enum OgmError {
    /// The metadata registry has no description for this type
    #[error("Unknown entity type: {0}")]
    UnknownType(TypeName),

    /// A relationship-only accessor was requested for a node or interface type
    #[error("Type {0} is not a relationship entity type")]
    NotARelationshipType(TypeName),

    /// The value of a primary-index field cannot be used as a key
    #[error("Unindexable primary key value of type {0}")]
    UnindexableValue(String),

    /// The metadata registry was declared inconsistently
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OgmResult<T> = Result<T, OgmError>;
