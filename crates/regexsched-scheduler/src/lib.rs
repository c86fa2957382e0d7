//! Regexsched Scheduler - filter plugins for pod to node placement
//!
//! This crate provides:
//! - The filter extension point and its three-way status model
//! - The `RegexScheduling` plugin (node name pattern from a pod annotation)
//! - A plugin registry and framework profile config
//! - A filter framework that evaluates nodes concurrently

pub mod config;
pub mod error;
pub mod filter;
pub mod framework;
pub mod logging;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use config::{FrameworkConfig, PluginConfig};
pub use error::{PluginError, Result};
pub use filter::{decide, FilterPlugin, RegexScheduling, REGEX_ANNOTATION_KEY};
pub use framework::{FilterReport, Framework};
pub use logging::{Klog, TracingKlog};
pub use registry::Registry;
pub use types::{CycleState, NodeInfo, NodeVerdict, Status, StatusCode};
