// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for manifest handling
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(regexsched::serialization_error),
        help("Ensure the manifest is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Manifest could not be read
    #[error("Failed to read manifest {path}")]
    #[diagnostic(
        code(regexsched::manifest_unreadable),
        help("Check that the file exists and is readable")
    )]
    ManifestUnreadable {
        #[allow(unused)]
        path: String,
        #[source]
        #[allow(unused)]
        source: std::io::Error,
    },

    /// Manifest has an unexpected shape or kind
    #[error("Invalid manifest: {reason}")]
    #[diagnostic(
        code(regexsched::invalid_manifest),
        help("{suggestion}")
    )]
    InvalidManifest {
        #[allow(unused)]
        reason: String,
        #[allow(unused)]
        suggestion: String,
    },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create a ManifestUnreadable error
    pub fn manifest_unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ManifestUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidManifest error
    pub fn invalid_manifest(reason: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::InvalidManifest {
            reason: reason.into(),
            suggestion: suggestion.into(),
        }
    }
}
