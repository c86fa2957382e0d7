//! Regexsched Core - Kubernetes object handling shared by the scheduler plugin and its host
//!
//! This crate provides:
//! - Error types with miette diagnostics
//! - Read-only accessors for pod annotations and node names
//! - Pod and node manifest loading (YAML or JSON)
//! - Serialization helpers

pub mod error;
pub mod manifest;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use manifest::{load_nodes, load_pod, nodes_from_str, pod_from_str};
pub use types::{node_name, pod_annotations, pod_name};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, Pod};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Serialize a value to JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Serialize a value to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}
