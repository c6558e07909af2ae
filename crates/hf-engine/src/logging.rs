//! Host logging sink and instance-scoped logger.
//!
//! Every message goes to `tracing`; the host sink additionally receives it
//! unless debug logging is off and the message is OK or Discard level.

use hf_core::Status;

/// Host-provided logging callback.
pub trait LogSink {
    fn log(&mut self, instance_name: &str, status: Status, category: &str, message: &str);
}

impl<F> LogSink for F
where
    F: FnMut(&str, Status, &str, &str),
{
    fn log(&mut self, instance_name: &str, status: Status, category: &str, message: &str) {
        self(instance_name, status, category, message)
    }
}

/// Sink that drops host messages; `tracing` output is unaffected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&mut self, _: &str, _: Status, _: &str, _: &str) {}
}

/// Logger owned by one instance.
pub struct HostLogger {
    instance_name: String,
    sink: Box<dyn LogSink>,
    enabled: bool,
    categories: Vec<String>,
}

impl HostLogger {
    pub fn new(instance_name: impl Into<String>, sink: Box<dyn LogSink>, enabled: bool) -> Self {
        Self {
            instance_name: instance_name.into(),
            sink,
            enabled,
            categories: Vec::new(),
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn set_enabled(&mut self, enabled: bool, categories: &[&str]) {
        self.enabled = enabled;
        self.categories = categories.iter().map(|c| (*c).to_string()).collect();
        tracing::debug!(
            instance = %self.instance_name,
            enabled,
            categories = ?self.categories,
            "debug logging changed"
        );
    }

    /// Emit a message at `status`.
    pub fn emit(&mut self, status: Status, message: &str) {
        let name = self.instance_name.as_str();
        match status {
            Status::Ok => tracing::debug!(instance = %name, "{message}"),
            Status::Warning | Status::Discard => {
                tracing::warn!(instance = %name, %status, "{message}")
            }
            Status::Error | Status::Fatal => {
                tracing::error!(instance = %name, %status, "{message}")
            }
        }
        if !self.enabled && status.is_suppressible() {
            return;
        }
        self.sink.log(name, status, status.category(), message);
    }
}

impl std::fmt::Debug for HostLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLogger")
            .field("instance_name", &self.instance_name)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
