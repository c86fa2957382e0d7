//! Pod and node manifest loading
//!
//! Manifests are YAML or JSON (JSON is accepted by the YAML parser). A node
//! manifest may hold a single node, a plain sequence of nodes, or a
//! `NodeList`/`List` object with an `items` field.

use crate::error::{CoreError, Result};
use k8s_openapi::api::core::v1::{Node, Pod};
use serde_yaml::Value;
use std::path::Path;

/// Read a manifest file into a string
pub fn read_manifest(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|e| CoreError::manifest_unreadable(path.display().to_string(), e))
}

/// Load a single pod from a manifest file
pub fn load_pod(path: impl AsRef<Path>) -> Result<Pod> {
    pod_from_str(&read_manifest(path)?)
}

/// Load nodes from a manifest file
pub fn load_nodes(path: impl AsRef<Path>) -> Result<Vec<Node>> {
    nodes_from_str(&read_manifest(path)?)
}

/// Decode a single pod manifest
pub fn pod_from_str(data: &str) -> Result<Pod> {
    let value = parse(data)?;
    expect_kind(&value, "Pod")?;
    decode(value, "Pod")
}

/// Decode a node manifest holding one node or a list of nodes
pub fn nodes_from_str(data: &str) -> Result<Vec<Node>> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    match parse(data)? {
        Value::Sequence(items) => decode_nodes(items),
        value @ Value::Mapping(_) => match kind_of(&value).map(str::to_owned).as_deref() {
            Some("NodeList") | Some("List") => match value.get("items") {
                Some(Value::Sequence(items)) => decode_nodes(items.clone()),
                Some(Value::Null) | None => Ok(Vec::new()),
                Some(_) => Err(CoreError::invalid_manifest(
                    "items must be a sequence",
                    "List nodes under items as a YAML sequence",
                )),
            },
            _ => {
                expect_kind(&value, "Node")?;
                Ok(vec![decode(value, "Node")?])
            }
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(CoreError::invalid_manifest(
            "expected a node, a list of nodes, or a NodeList",
            "Provide a YAML mapping or sequence",
        )),
    }
}

fn parse(data: &str) -> Result<Value> {
    serde_yaml::from_str(data).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to parse manifest: {}", e),
            Some(Box::new(e)),
        )
    })
}

fn kind_of(value: &Value) -> Option<&str> {
    value.get("kind").and_then(Value::as_str)
}

fn expect_kind(value: &Value, expected: &str) -> Result<()> {
    match kind_of(value) {
        Some(kind) if kind != expected => Err(CoreError::invalid_manifest(
            format!("expected kind {}, found {}", expected, kind),
            format!("Set kind: {} or omit the kind field", expected),
        )),
        _ => Ok(()),
    }
}

fn decode<T: serde::de::DeserializeOwned>(mut value: Value, kind: &str) -> Result<T> {
    // k8s-openapi checks apiVersion/kind, so fill them in for bare manifests
    if let Value::Mapping(map) = &mut value {
        if !map.contains_key("apiVersion") {
            map.insert(
                Value::String("apiVersion".to_string()),
                Value::String("v1".to_string()),
            );
        }
        if !map.contains_key("kind") {
            map.insert(
                Value::String("kind".to_string()),
                Value::String(kind.to_string()),
            );
        }
    }

    serde_yaml::from_value(value).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to decode {}: {}", kind, e),
            Some(Box::new(e)),
        )
    })
}

fn decode_nodes(items: Vec<Value>) -> Result<Vec<Node>> {
    items
        .into_iter()
        .map(|item| {
            expect_kind(&item, "Node")?;
            decode(item, "Node")
        })
        .collect()
}
