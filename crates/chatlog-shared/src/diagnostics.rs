//! Diagnostics sink injected into every resolution component.
//!
//! Components report degraded outcomes (undecodable blobs, missing files,
//! failed decryption) as an event name plus key/value fields and keep their
//! own return values pure. The default sink forwards to `tracing`.

use std::sync::{Arc, Mutex};

/// Receiver for non-fatal diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn warn(&self, event: &str, fields: &[(&str, &str)]);

    fn debug(&self, _event: &str, _fields: &[(&str, &str)]) {}
}

/// Sink that emits every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        tracing::warn!(event = %event, fields = %render_fields(fields), "diagnostic");
    }

    fn debug(&self, event: &str, fields: &[(&str, &str)]) {
        tracing::debug!(event = %event, fields = %render_fields(fields), "diagnostic");
    }
}

fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v:?}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sink that keeps warnings in memory, used by tests and for end-of-run
/// summaries.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn warn(&self, event: &str, _fields: &[(&str, &str)]) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.to_string());
        }
    }
}

impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for (A, B) {
    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        self.0.warn(event, fields);
        self.1.warn(event, fields);
    }

    fn debug(&self, event: &str, fields: &[(&str, &str)]) {
        self.0.debug(event, fields);
        self.1.debug(event, fields);
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn warn(&self, event: &str, fields: &[(&str, &str)]) {
        (**self).warn(event, fields);
    }

    fn debug(&self, event: &str, fields: &[(&str, &str)]) {
        (**self).debug(event, fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_render_as_key_value_pairs() {
        let rendered = render_fields(&[("path", "a/b"), ("id", "7")]);
        assert_eq!(rendered, "path=\"a/b\" id=\"7\"");
    }

    #[test]
    fn recording_sink_counts_events() {
        let sink = RecordingSink::default();
        sink.warn("missing", &[]);
        sink.warn("missing", &[("id", "1")]);
        sink.debug("ignored", &[]);
        assert_eq!(sink.count("missing"), 2);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn pair_fans_out_to_shared_recorder() {
        let recorder = Arc::new(RecordingSink::default());
        let pair = (TracingSink, recorder.clone());
        pair.warn("path_not_found", &[("hint", "x")]);
        assert_eq!(recorder.count("path_not_found"), 1);
    }
}
