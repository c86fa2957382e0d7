use k8s_openapi::api::core::v1::{Node, Pod};
use std::collections::BTreeMap;

static NO_ANNOTATIONS: BTreeMap<String, String> = BTreeMap::new();

/// Annotations of a pod. A pod without an annotation map has none.
pub fn pod_annotations(pod: &Pod) -> &BTreeMap<String, String> {
    pod.metadata.annotations.as_ref().unwrap_or(&NO_ANNOTATIONS)
}

/// Pod name, or the empty string when unset
pub fn pod_name(pod: &Pod) -> &str {
    pod.metadata.name.as_deref().unwrap_or_default()
}

/// Node name, or the empty string when unset
pub fn node_name(node: &Node) -> &str {
    node.metadata.name.as_deref().unwrap_or_default()
}
