use crate::filter::{FilterPlugin, RegexScheduling};
use crate::logging::Klog;
use crate::{PluginError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Builds a filter plugin from a logging capability and a raw args payload
pub type PluginFactory =
    Arc<dyn Fn(Arc<dyn Klog>, &[u8]) -> Result<Arc<dyn FilterPlugin>> + Send + Sync>;

/// Plugin registry mapping plugin names to factories
///
/// `Registry::default()` knows every plugin shipped in this crate;
/// `Registry::new()` starts empty.
#[derive(Clone)]
pub struct Registry {
    factories: BTreeMap<String, PluginFactory>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a factory under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(Arc<dyn Klog>, &[u8]) -> Result<Arc<dyn FilterPlugin>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(PluginError::duplicate_plugin(name));
        }
        debug!("Registering plugin {}", name);
        self.factories.insert(name, Arc::new(factory));
        Ok(())
    }

    /// Whether a factory is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered plugin names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Construct the plugin registered under `name`
    ///
    /// The args payload must be empty or well-formed JSON; a malformed
    /// payload is rejected before the factory runs.
    pub fn build(
        &self,
        name: &str,
        log: Arc<dyn Klog>,
        args: &[u8],
    ) -> Result<Arc<dyn FilterPlugin>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::unknown_plugin(name))?;
        parse_args(name, args)?;

        let plugin = factory(log, args)?;
        if plugin.name() != name {
            return Err(PluginError::internal_error(format!(
                "Factory registered as {} built plugin {}",
                name,
                plugin.name()
            )));
        }

        Ok(plugin)
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut factories: BTreeMap<String, PluginFactory> = BTreeMap::new();
        factories.insert(
            RegexScheduling::NAME.to_string(),
            Arc::new(RegexScheduling::factory),
        );
        Self { factories }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Parse a plugin args payload
///
/// Empty (or whitespace-only) payloads are `None`; anything else must be a
/// well-formed JSON document.
pub fn parse_args(plugin: &str, args: &[u8]) -> Result<Option<serde_json::Value>> {
    if args.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(args)
        .map(Some)
        .map_err(|e| PluginError::invalid_config(plugin, e.to_string()))
}
