use crate::config::FrameworkConfig;
use crate::filter::FilterPlugin;
use crate::logging::Klog;
use crate::registry::Registry;
use crate::types::{CycleState, NodeInfo, NodeVerdict, Status, StatusCode};
use crate::{PluginError, Result};
use regexsched_core::{node_name, pod_name, Node, Pod};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Filter stage of the scheduling pipeline
///
/// Owns one instance of every enabled filter plugin for the lifetime of the
/// host process. Plugins are built once, up front; a plugin that fails to
/// build aborts construction of the whole framework.
pub struct Framework {
    filters: Arc<[Arc<dyn FilterPlugin>]>,
    parallelism: usize,
}

impl Framework {
    /// Build every filter plugin listed in `config`
    pub fn new(registry: &Registry, config: &FrameworkConfig, log: Arc<dyn Klog>) -> Result<Self> {
        config.validate()?;

        let mut filters = Vec::with_capacity(config.filters.len());
        for plugin in &config.filters {
            let args = plugin.args_bytes()?;
            let filter = registry
                .build(&plugin.name, log.clone(), &args)
                .inspect_err(|e| {
                    let message = e.to_string();
                    log.error(
                        "Failed to construct plugin",
                        &[("plugin", plugin.name.as_str()), ("error", message.as_str())],
                    )
                })?;
            filters.push(filter);
        }

        info!(
            "Framework ready with filters [{}], parallelism {}",
            config
                .filters
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            config.parallelism
        );

        Ok(Self::from_plugins(filters, config.parallelism))
    }

    /// Assemble a framework from already constructed plugins
    pub fn from_plugins(filters: Vec<Arc<dyn FilterPlugin>>, parallelism: usize) -> Self {
        Self {
            filters: filters.into(),
            parallelism: parallelism.max(1),
        }
    }

    /// Names of the enabled filter plugins, in run order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter plugin against one node
    ///
    /// Plugins run in configured order; the first non-success status wins.
    pub fn run_filter_plugins(&self, state: &CycleState, pod: &Pod, node_info: &NodeInfo) -> NodeVerdict {
        run_filters(&self.filters, state, pod, node_info)
    }

    /// Evaluate every node for `pod`
    ///
    /// One cycle state is shared by all nodes of this pass. Nodes are
    /// evaluated concurrently, at most `parallelism` at a time; verdicts come
    /// back in input order.
    pub async fn find_feasible_nodes(&self, pod: &Pod, nodes: Vec<Node>) -> Result<FilterReport> {
        let pod_name = pod_name(pod).to_string();
        debug!("Filtering {} nodes for pod {}", nodes.len(), pod_name);

        let pod = Arc::new(pod.clone());
        let state = Arc::new(CycleState::new());
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let names: Vec<String> = nodes.iter().map(|n| node_name(n).to_string()).collect();

        let mut tasks = JoinSet::new();
        for (index, node) in nodes.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| PluginError::internal_error(format!("Semaphore closed: {}", e)))?;
            let filters = self.filters.clone();
            let pod = pod.clone();
            let state = state.clone();

            tasks.spawn_blocking(move || {
                let _permit = permit;
                let verdict = run_filters(&filters, &state, &pod, &NodeInfo::new(node));
                (index, verdict)
            });
        }

        let mut verdicts: Vec<Option<NodeVerdict>> = vec![None; names.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, verdict)) => verdicts[index] = Some(verdict),
                Err(e) => warn!("Filter task for pod {} failed: {}", pod_name, e),
            }
        }

        // A task that panicked leaves its slot empty
        let verdicts: Vec<NodeVerdict> = verdicts
            .into_iter()
            .zip(names)
            .map(|(verdict, name)| {
                verdict.unwrap_or_else(|| {
                    NodeVerdict::fail(
                        name,
                        "Framework".to_string(),
                        Status::error("filter plugin panicked"),
                    )
                })
            })
            .collect();

        let report = FilterReport { pod_name, verdicts };

        info!(
            "Pod {} has {} feasible nodes out of {}",
            report.pod_name,
            report.feasible_nodes().len(),
            report.verdicts.len()
        );

        Ok(report)
    }
}

fn run_filters(
    filters: &[Arc<dyn FilterPlugin>],
    state: &CycleState,
    pod: &Pod,
    node_info: &NodeInfo,
) -> NodeVerdict {
    let node_name = node_info.name().to_string();

    for filter in filters {
        let status = filter.filter(state, pod, node_info);
        match status.code() {
            StatusCode::Success => continue,
            StatusCode::Unschedulable => {
                debug!(
                    "Node {} filtered out by {}: {}",
                    node_name,
                    filter.name(),
                    status.reason().unwrap_or_default()
                );
            }
            StatusCode::Error => {
                warn!(
                    "Filter {} failed on node {} for pod {}: {}",
                    filter.name(),
                    node_name,
                    pod_name(pod),
                    status.reason().unwrap_or_default()
                );
            }
        }
        return NodeVerdict::fail(node_name, filter.name().to_string(), status);
    }

    NodeVerdict::pass(node_name)
}

/// Outcome of the filter stage for one pod
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    /// Pod name
    pub pod_name: String,
    /// One verdict per node, in input order
    pub verdicts: Vec<NodeVerdict>,
}

impl FilterReport {
    /// Names of nodes every filter accepted
    pub fn feasible_nodes(&self) -> Vec<&str> {
        self.verdicts
            .iter()
            .filter(|v| v.passed())
            .map(|v| v.node_name.as_str())
            .collect()
    }

    /// Whether at least one node passed every filter
    pub fn is_schedulable(&self) -> bool {
        self.verdicts.iter().any(NodeVerdict::passed)
    }

    /// Verdicts where a filter could not decide; these are internal faults,
    /// not placement failures
    pub fn errors(&self) -> Vec<&NodeVerdict> {
        self.verdicts
            .iter()
            .filter(|v| v.status.code() == StatusCode::Error)
            .collect()
    }

    /// Scheduling-failure summary in the form
    /// `0/3 nodes are available: 1 <reason>, 2 <reason>.`
    ///
    /// Only `Unschedulable` reasons are aggregated. Nodes whose filters
    /// errored are counted as a group, their reasons are left to
    /// [`FilterReport::errors`]. `None` when at least one node is feasible.
    pub fn diagnosis(&self) -> Option<String> {
        if self.is_schedulable() {
            return None;
        }

        let total = self.verdicts.len();
        if total == 0 {
            return Some("0/0 nodes are available.".to_string());
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for verdict in &self.verdicts {
            if verdict.status.code() != StatusCode::Unschedulable {
                continue;
            }
            if let Some(reason) = verdict.status.reason() {
                *counts.entry(reason).or_default() += 1;
            }
        }

        let mut reasons: Vec<String> = counts
            .into_iter()
            .map(|(reason, count)| format!("{} {}", count, reason))
            .collect();

        // Error reasons belong to errors(); only their count shows up here
        match self.errors().len() {
            0 => {}
            1 => reasons.push("1 node had a filter error".to_string()),
            n => reasons.push(format!("{} nodes had filter errors", n)),
        }

        Some(format!(
            "0/{} nodes are available: {}.",
            total,
            reasons.join(", ")
        ))
    }
}
