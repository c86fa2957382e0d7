use crate::logging::Klog;
use crate::types::{CycleState, NodeInfo, Status};
use crate::Result;
use regex::Regex;
use regexsched_core::{pod_annotations, Pod};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pod annotation holding the node name pattern
pub const REGEX_ANNOTATION_KEY: &str = "scheduler.example.com/regex";

/// Filter extension point
///
/// Implementations are shared between concurrent filter calls for different
/// nodes and different pods, so they must not hold per-call mutable state.
pub trait FilterPlugin: Send + Sync {
    /// Name the plugin is registered under
    fn name(&self) -> &str;

    /// Decide whether `node_info` can host `pod`
    fn filter(&self, state: &CycleState, pod: &Pod, node_info: &NodeInfo) -> Status;
}

/// Match a node name against the pattern in a pod's annotations
///
/// A missing annotation always succeeds. The pattern is matched anywhere in
/// the node name, not anchored: `abc` matches `node-abc-1`. An invalid
/// pattern yields an `Error` status, never a panic.
pub fn decide(annotations: &BTreeMap<String, String>, node_name: &str) -> Status {
    let Some(pattern) = annotations.get(REGEX_ANNOTATION_KEY) else {
        return Status::success();
    };

    // Compiled per call; patterns are never shared between invocations
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            return Status::error(format!(
                "Failed to compile regex \"{}\": {}",
                pattern, e
            ))
        }
    };

    if !regex.is_match(node_name) {
        return Status::unschedulable(format!(
            "Node \"{}\" does not match regex \"{}\"",
            node_name, pattern
        ));
    }

    Status::success()
}

/// Filter plugin restricting pods to nodes whose name matches the pattern in
/// the `scheduler.example.com/regex` annotation
#[derive(Debug)]
pub struct RegexScheduling;

impl RegexScheduling {
    /// Registry name of the plugin
    pub const NAME: &'static str = "RegexScheduling";

    /// Construct the plugin
    ///
    /// The args payload is ignored; [`Registry::build`](crate::Registry::build)
    /// checks that it is well-formed before the plugin sees it.
    pub fn new(log: Arc<dyn Klog>, _args: &[u8]) -> Result<Self> {
        log.info("Plugin constructed", &[("plugin", Self::NAME)]);
        Ok(Self)
    }

    /// Registry factory
    pub fn factory(log: Arc<dyn Klog>, args: &[u8]) -> Result<Arc<dyn FilterPlugin>> {
        Ok(Arc::new(Self::new(log, args)?))
    }
}

impl FilterPlugin for RegexScheduling {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn filter(&self, _state: &CycleState, pod: &Pod, node_info: &NodeInfo) -> Status {
        decide(pod_annotations(pod), node_info.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::testing::RecordingKlog;
    use crate::logging::TracingKlog;
    use crate::types::StatusCode;
    use proptest::prelude::*;
    use regexsched_core::Node;

    fn annotated(pattern: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(REGEX_ANNOTATION_KEY.to_string(), pattern.to_string())])
    }

    fn create_test_pod(pattern: Option<&str>) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some("test-pod".to_string());
        pod.metadata.annotations = pattern.map(annotated);
        pod
    }

    fn create_test_node(name: &str) -> NodeInfo {
        let mut node = Node::default();
        node.metadata.name = Some(name.to_string());
        NodeInfo::new(node)
    }

    fn plugin() -> RegexScheduling {
        RegexScheduling::new(Arc::new(TracingKlog::new()), b"").unwrap()
    }

    #[test]
    fn test_no_annotation_succeeds() {
        let status = decide(&BTreeMap::new(), "node-1");
        assert_eq!(status, Status::success());
    }

    #[test]
    fn test_matching_prefix_succeeds() {
        let status = decide(&annotated("^node-a"), "node-abc");
        assert_eq!(status.code(), StatusCode::Success);
        assert!(status.reason().is_none());
    }

    #[test]
    fn test_non_matching_is_unschedulable() {
        let status = decide(&annotated("^node-b"), "node-abc");
        assert_eq!(status.code(), StatusCode::Unschedulable);
        assert_eq!(
            status.reason(),
            Some(r#"Node "node-abc" does not match regex "^node-b""#)
        );
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let status = decide(&annotated("(unclosed"), "node-abc");
        assert_eq!(status.code(), StatusCode::Error);
        let reason = status.reason().unwrap();
        assert!(reason.starts_with(r#"Failed to compile regex "(unclosed": "#));
        assert!(reason.contains("(unclosed"));
    }

    #[test]
    fn test_match_is_unanchored() {
        assert!(decide(&annotated("abc"), "node-abc-1").is_success());
        assert!(!decide(&annotated("^abc$"), "node-abc-1").is_success());
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(decide(&annotated(""), "").is_success());
        assert!(decide(&annotated(""), "node-1").is_success());
    }

    #[test]
    fn test_empty_node_name() {
        let status = decide(&annotated("node"), "");
        assert_eq!(status.code(), StatusCode::Unschedulable);
        assert_eq!(status.reason(), Some(r#"Node "" does not match regex "node""#));
    }

    #[test]
    fn test_annotation_key_is_case_sensitive() {
        let annotations = BTreeMap::from([(
            "Scheduler.Example.com/Regex".to_string(),
            "^nothing$".to_string(),
        )]);
        assert!(decide(&annotations, "node-1").is_success());
    }

    #[test]
    fn test_other_annotations_are_ignored() {
        let mut annotations = annotated("^gpu-");
        annotations.insert("example.com/owner".to_string(), "(".to_string());
        assert!(decide(&annotations, "gpu-7").is_success());
    }

    #[test]
    fn test_special_characters_in_node_name() {
        assert!(decide(&annotated(r"\.example\.com$"), "node.example.com").is_success());
        assert_eq!(
            decide(&annotated("^node$"), "nöde-λ/\n").code(),
            StatusCode::Unschedulable
        );
    }

    #[test]
    fn test_pathological_pattern_completes() {
        // Backtracking engines blow up on this; the regex crate stays linear
        let node_name = "a".repeat(10_000);
        let status = decide(&annotated("(a|aa)*b"), &node_name);
        assert_eq!(status.code(), StatusCode::Unschedulable);
    }

    #[test]
    fn test_oversized_pattern_is_error() {
        let status = decide(&annotated(r"(?:\w{1000}){1000}"), "node-1");
        assert_eq!(status.code(), StatusCode::Error);
    }

    #[test]
    fn test_plugin_filter_reads_pod_annotations() {
        let plugin = plugin();
        let state = CycleState::new();

        let pod = create_test_pod(Some("^node-a"));
        assert!(plugin.filter(&state, &pod, &create_test_node("node-abc")).is_success());
        assert_eq!(
            plugin.filter(&state, &pod, &create_test_node("node-b")).code(),
            StatusCode::Unschedulable
        );

        let pod = create_test_pod(None);
        assert!(plugin.filter(&state, &pod, &create_test_node("anything")).is_success());

        // The plugin leaves cycle state untouched
        assert!(state.is_empty());
    }

    #[test]
    fn test_plugin_filter_unnamed_node() {
        let plugin = plugin();
        let pod = create_test_pod(Some("^$"));
        let status = plugin.filter(&CycleState::new(), &pod, &NodeInfo::new(Node::default()));
        assert!(status.is_success());
    }

    #[test]
    fn test_plugin_name() {
        assert_eq!(plugin().name(), "RegexScheduling");
    }

    #[test]
    fn test_construction_logs_once() {
        let log = Arc::new(RecordingKlog::default());
        RegexScheduling::new(log.clone(), b"{}").unwrap();

        let entries = log.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "info");
        assert!(entries[0].1.contains("RegexScheduling"));
    }

    #[test]
    fn test_construction_accepts_empty_and_json_args() {
        let log: Arc<dyn Klog> = Arc::new(TracingKlog::new());
        assert!(RegexScheduling::new(log.clone(), b"").is_ok());
        assert!(RegexScheduling::new(log.clone(), b"  \n").is_ok());
        assert!(RegexScheduling::new(log.clone(), b"null").is_ok());
        assert!(RegexScheduling::new(log, br#"{"anything": [1, 2, 3]}"#).is_ok());
    }

    #[test]
    fn test_construction_ignores_payload_contents() {
        let log: Arc<dyn Klog> = Arc::new(TracingKlog::new());
        assert!(RegexScheduling::new(log.clone(), b"{not json").is_ok());
        assert!(RegexScheduling::new(log, &[0xff, 0x00, 0x7f]).is_ok());
    }

    #[test]
    fn test_concurrent_filter_calls_agree() {
        let plugin = plugin();
        let pod = create_test_pod(Some("^node-[0-4]$"));
        let state = CycleState::new();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..10)
                .map(|i| {
                    let (plugin, pod, state) = (&plugin, &pod, &state);
                    scope.spawn(move || {
                        let node = create_test_node(&format!("node-{}", i));
                        (i, plugin.filter(state, pod, &node))
                    })
                })
                .collect();

            for handle in handles {
                let (i, status) = handle.join().unwrap();
                assert_eq!(status.is_success(), i < 5, "node-{}", i);
            }
        });
    }

    proptest! {
        #[test]
        fn missing_key_always_succeeds(
            annotations in prop::collection::btree_map("[a-z./-]{0,24}", ".{0,16}", 0..6),
            node_name in ".{0,64}",
        ) {
            prop_assume!(!annotations.contains_key(REGEX_ANNOTATION_KEY));
            prop_assert_eq!(decide(&annotations, &node_name), Status::success());
        }

        #[test]
        fn contained_literal_succeeds(
            prefix in ".{0,16}",
            middle in ".{0,16}",
            suffix in ".{0,16}",
        ) {
            let node_name = format!("{}{}{}", prefix, middle, suffix);
            let pattern = regex::escape(&middle);
            prop_assert!(decide(&annotated(&pattern), &node_name).is_success());
        }

        #[test]
        fn absent_literal_is_unschedulable(
            node_name in "[a-z-]{0,32}",
            literal in "[0-9]{1,8}",
        ) {
            let status = decide(&annotated(&literal), &node_name);
            prop_assert_eq!(status.code(), StatusCode::Unschedulable);
            let reason = status.reason().unwrap();
            prop_assert!(reason.contains(&node_name));
            prop_assert!(reason.contains(&literal));
        }

        #[test]
        fn unbalanced_group_is_error(
            body in "[a-z0-9]{0,16}",
            node_name in ".{0,32}",
        ) {
            let pattern = format!("({}", body);
            let status = decide(&annotated(&pattern), &node_name);
            prop_assert_eq!(status.code(), StatusCode::Error);
            prop_assert!(status.reason().unwrap().contains(&pattern));
        }

        #[test]
        fn decisions_are_repeatable(
            pattern in ".{0,24}",
            node_name in ".{0,64}",
        ) {
            let annotations = annotated(&pattern);
            let first = decide(&annotations, &node_name);
            let second = decide(&annotations, &node_name);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn long_inputs_return(
            unit in "[a-z]{1,4}",
            pattern in "[a-z|*+?()]{0,32}",
        ) {
            let node_name = unit.repeat(10_000 / unit.len());
            // Any of the three outcomes is fine; the call must come back
            let _ = decide(&annotated(&pattern), &node_name);
        }
    }
}
