//! Error types for the attr boundary and configuration files.

use thiserror::Error;

/// Errors raised while accepting persisted shape attrs.
#[derive(Error, Debug)]
pub enum AttrError {
    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A shape with an empty identifier
    #[error("Shape at index {index} has an empty id")]
    EmptyId {
        /// Position of the attr in the input list
        index: usize,
    },

    /// Two attrs share one identifier
    #[error("Duplicate shape id: {id}")]
    DuplicateId {
        /// The repeated id
        id: String,
    },

    /// Geometry that cannot describe a shape of its kind
    #[error("Invalid geometry for shape '{id}': {message}")]
    InvalidGeometry {
        /// The offending shape
        id: String,
        /// Description of the problem
        message: String,
    },

    /// A real-world measurement field the shape kind does not have
    #[error("Shape '{id}' has no '{field}' measurement")]
    UnexpectedField {
        /// The offending shape
        id: String,
        /// Name of the field
        field: String,
    },

    /// NaN or infinite coordinate
    #[error("Non-finite value in field '{field}' of shape '{id}'")]
    NonFinite {
        /// The offending shape
        id: String,
        /// Name of the field
        field: String,
    },
}

impl AttrError {
    /// Create an invalid geometry error.
    pub fn invalid_geometry(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
