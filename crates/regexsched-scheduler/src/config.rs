//! Framework profile config (strict YAML parsing).

use crate::filter::RegexScheduling;
use crate::{PluginError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default number of nodes evaluated concurrently
pub const DEFAULT_PARALLELISM: usize = 16;

/// Which filter plugins run, in which order, with which args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameworkConfig {
    /// Maximum number of nodes evaluated at once
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Enabled filter plugins, run in order
    #[serde(default = "default_filters")]
    pub filters: Vec<PluginConfig>,
}

/// One enabled plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    /// Registry name of the plugin
    pub name: String,
    /// Opaque args handed to the plugin as a JSON payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
}

fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}

fn default_filters() -> Vec<PluginConfig> {
    vec![PluginConfig::new(RegexScheduling::NAME)]
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            filters: default_filters(),
        }
    }
}

impl FrameworkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(PluginError::invalid_framework_config(
                "parallelism must be at least 1",
                "Set parallelism to a positive number or omit it",
            ));
        }

        if self.filters.is_empty() {
            return Err(PluginError::invalid_framework_config(
                "no filter plugins enabled",
                "List at least one plugin under filters",
            ));
        }

        let mut seen = HashSet::new();
        for plugin in &self.filters {
            if plugin.name.trim().is_empty() {
                return Err(PluginError::invalid_framework_config(
                    "filter plugin with empty name",
                    "Give every entry under filters a name",
                ));
            }
            if !seen.insert(plugin.name.as_str()) {
                return Err(PluginError::invalid_framework_config(
                    format!("plugin {} enabled more than once", plugin.name),
                    "Remove the duplicate entry under filters",
                ));
            }
        }

        Ok(())
    }
}

impl PluginConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = Some(args);
        self
    }

    /// Raw args payload; empty when no args are configured
    pub fn args_bytes(&self) -> Result<Vec<u8>> {
        match &self.args {
            None => Ok(Vec::new()),
            Some(args) => serde_json::to_vec(args).map_err(|e| {
                PluginError::internal_error(format!(
                    "Failed to encode args for plugin {}: {}",
                    self.name, e
                ))
            }),
        }
    }
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<FrameworkConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .map_err(|e| PluginError::config_unreadable(path.display().to_string(), e))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<FrameworkConfig> {
    let cfg: FrameworkConfig = if s.trim().is_empty() {
        FrameworkConfig::default()
    } else {
        serde_yaml::from_str(s).map_err(|e| {
            PluginError::invalid_framework_config(
                format!("invalid yaml: {}", e),
                "Check the config against the documented fields: parallelism, filters",
            )
        })?
    };
    cfg.validate()?;
    Ok(cfg)
}
