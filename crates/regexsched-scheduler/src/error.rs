// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Plugin construction and framework setup errors
///
/// Every variant is a startup fault: the host must not accept scheduling
/// work once one of these is returned. Decision-time problems are reported
/// through [`crate::Status`] instead.
#[derive(Error, Debug, Diagnostic)]
pub enum PluginError {
    /// Plugin configuration payload could not be parsed
    #[error("Invalid configuration for plugin {plugin}: {message}")]
    #[diagnostic(
        code(scheduler::invalid_config),
        help("Plugin args must be empty or a well-formed JSON document")
    )]
    InvalidConfig {
        plugin: String,
        message: String,
    },

    /// Plugin name is not in the registry
    #[error("Unknown plugin: {name}")]
    #[diagnostic(
        code(scheduler::unknown_plugin),
        help("Run `regexsched plugins` to list registered plugins")
    )]
    UnknownPlugin {
        name: String,
    },

    /// Plugin name registered twice
    #[error("Plugin already registered: {name}")]
    #[diagnostic(
        code(scheduler::duplicate_plugin),
        help("Each plugin name may only be registered once")
    )]
    DuplicatePlugin {
        name: String,
    },

    /// Framework configuration is invalid
    #[error("Invalid framework configuration: {message}")]
    #[diagnostic(
        code(scheduler::invalid_framework_config),
        help("{suggestion}")
    )]
    InvalidFrameworkConfig {
        message: String,
        suggestion: String,
    },

    /// Framework configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    #[diagnostic(
        code(scheduler::config_unreadable),
        help("Check that the file exists and is readable")
    )]
    ConfigUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(scheduler::internal_error),
        help("This is likely a bug. Please report it")
    )]
    InternalError {
        message: String,
    },
}

/// Result type for plugin and framework setup
pub type Result<T> = std::result::Result<T, PluginError>;

impl PluginError {
    /// Create an InvalidConfig error
    pub fn invalid_config(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Create an UnknownPlugin error
    pub fn unknown_plugin(name: impl Into<String>) -> Self {
        Self::UnknownPlugin { name: name.into() }
    }

    /// Create a DuplicatePlugin error
    pub fn duplicate_plugin(name: impl Into<String>) -> Self {
        Self::DuplicatePlugin { name: name.into() }
    }

    /// Create an InvalidFrameworkConfig error
    pub fn invalid_framework_config(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::InvalidFrameworkConfig {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a ConfigUnreadable error
    pub fn config_unreadable(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ConfigUnreadable {
            path: path.into(),
            source,
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
