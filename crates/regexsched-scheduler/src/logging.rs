use std::fmt::Write;
use tracing::{error, info};

/// Structured logging capability handed to plugins at construction
///
/// Key/value pairs follow the message, in the order given.
pub trait Klog: Send + Sync {
    /// Log an informational message
    fn info(&self, msg: &str, fields: &[(&str, &str)]);

    /// Log an error message
    fn error(&self, msg: &str, fields: &[(&str, &str)]);
}

/// Klog implementation backed by `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingKlog;

impl TracingKlog {
    pub fn new() -> Self {
        Self
    }
}

impl Klog for TracingKlog {
    fn info(&self, msg: &str, fields: &[(&str, &str)]) {
        info!(target: "regexsched::plugin", fields = %render_fields(fields), "{}", msg);
    }

    fn error(&self, msg: &str, fields: &[(&str, &str)]) {
        error!(target: "regexsched::plugin", fields = %render_fields(fields), "{}", msg);
    }
}

/// Render key/value pairs as `key="value"` separated by spaces
pub fn render_fields(fields: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail
        let _ = write!(out, "{}={:?}", key, value);
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fields() {
        assert_eq!(render_fields(&[]), "");
        assert_eq!(
            render_fields(&[("plugin", "RegexScheduling"), ("args", "")]),
            r#"plugin="RegexScheduling" args="""#
        );
    }

    #[test]
    fn test_tracing_klog_does_not_panic_without_subscriber() {
        let log = TracingKlog::new();
        log.info("constructed", &[("plugin", "RegexScheduling")]);
        log.error("failed", &[]);
    }
}
