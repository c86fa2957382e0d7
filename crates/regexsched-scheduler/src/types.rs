use regexsched_core::Node;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome code of a filter evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Node is eligible
    Success,
    /// Node is ineligible for this pod
    Unschedulable,
    /// The filter itself could not reach a decision
    Error,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusCode::Success => "Success",
            StatusCode::Unschedulable => "Unschedulable",
            StatusCode::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Result of running a filter plugin against one node
///
/// `Success` never carries a reason; `Unschedulable` and `Error` always carry
/// a non-empty one. Fields are private so no other combination can be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    code: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Status {
    /// Create a success status
    pub fn success() -> Self {
        Self {
            code: StatusCode::Success,
            reason: None,
        }
    }

    /// Create an unschedulable status
    pub fn unschedulable(reason: impl Into<String>) -> Self {
        Self::with_reason(StatusCode::Unschedulable, reason.into())
    }

    /// Create an error status
    pub fn error(reason: impl Into<String>) -> Self {
        Self::with_reason(StatusCode::Error, reason.into())
    }

    fn with_reason(code: StatusCode, reason: String) -> Self {
        let reason = if reason.is_empty() {
            code.to_string()
        } else {
            reason
        };
        Self {
            code,
            reason: Some(reason),
        }
    }

    /// Status code
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Reason, present for every code except `Success`
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Whether the code is `Success`
    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.code, reason),
            None => write!(f, "{}", self.code),
        }
    }
}

/// Per-scheduling-cycle key/value store
///
/// One instance lives for one pod's pass through the filter stage and is
/// shared by every filter call in that pass, including calls running on
/// different threads for different nodes.
#[derive(Default)]
pub struct CycleState {
    data: parking_lot::RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl CycleState {
    /// Create an empty cycle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a value, returning `None` when the key is missing or holds another type
    pub fn read<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.data.read().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Write a value, replacing any previous value under the key
    pub fn write<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.data.write().insert(key.into(), Arc::new(value));
    }

    /// Delete a key, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the state holds no entries
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl fmt::Debug for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.read();
        let mut keys: Vec<&String> = data.keys().collect();
        keys.sort();
        f.debug_struct("CycleState").field("keys", &keys).finish()
    }
}

/// Node descriptor handed to filter plugins
#[derive(Debug, Clone)]
pub struct NodeInfo {
    node: Node,
}

impl NodeInfo {
    /// Wrap a node
    pub fn new(node: Node) -> Self {
        Self { node }
    }

    /// The underlying node object
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Node name, or the empty string when the node has none
    pub fn name(&self) -> &str {
        regexsched_core::node_name(&self.node)
    }
}

impl From<Node> for NodeInfo {
    fn from(node: Node) -> Self {
        Self::new(node)
    }
}

/// Filter outcome for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeVerdict {
    /// Node name
    pub node_name: String,
    /// Combined status of all filter plugins
    pub status: Status,
    /// Plugin that produced a non-success status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

impl NodeVerdict {
    /// Create a passing verdict
    pub fn pass(node_name: String) -> Self {
        Self {
            node_name,
            status: Status::success(),
            plugin: None,
        }
    }

    /// Create a verdict rejected or errored by a plugin
    pub fn fail(node_name: String, plugin: String, status: Status) -> Self {
        Self {
            node_name,
            status,
            plugin: Some(plugin),
        }
    }

    pub fn passed(&self) -> bool {
        self.status.is_success()
    }
}
