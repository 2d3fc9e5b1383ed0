//! Event sink trait and implementations.
//!
//! The engine emits an event for every state-changing operation
//! (`workflow.created`, `stage.drafted`, `stage.confirmed`,
//! `stage.locked`, `stage.reset`, `workflow.assembled`). Sinks are
//! synchronous: every core operation is an in-memory call and emission
//! must never block or fail it.

use std::fmt::Debug;
use tracing::{debug, info, Level};

/// Trait for event sinks that receive workflow events.
pub trait EventSink: Send + Sync + Debug {
    /// Emits an event.
    ///
    /// Implementations must not panic; errors are logged and suppressed.
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        match self.level {
            Level::DEBUG => {
                debug!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
            _ => {
                info!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("test", None);
        sink.emit("test", Some(serde_json::json!({"x": 1})));
        // Should not panic
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit("stage.locked", Some(serde_json::json!({"stage": "stage1"})));
        // Should not panic
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("stage.drafted", None);
        sink.emit("stage.locked", Some(serde_json::json!({"stage": "stage1"})));

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(events[0].0, "stage.drafted");
        assert_eq!(events[1].0, "stage.locked");
    }

    #[test]
    fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit("stage.drafted", None);
        sink.emit("stage.locked", None);
        sink.emit("workflow.assembled", None);

        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events_of_type("workflow.").len(), 1);
    }

    #[test]
    fn test_collecting_sink_clear() {
        let sink = CollectingEventSink::new();
        sink.emit("event", None);
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
