//! Structured lifecycle/telemetry events
//!
//! The engine and session controller never log through a global; they hold an
//! injected `Rc<dyn EventSink>`. Emission is fire-and-forget and must never
//! fail into the caller.

use std::cell::RefCell;

use log::Level;
use serde_json::Value;

/// Receives structured events from the engine and controller
pub trait EventSink {
    fn emit(&self, level: Level, message: &str, data: Value);
}

/// Forwards events to the `log` facade (console_log on web, env_logger native)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    const TARGET: &'static str = "flappy_kiro::events";
}

impl EventSink for LogSink {
    fn emit(&self, level: Level, message: &str, data: Value) {
        if data.is_null() {
            log::log!(target: Self::TARGET, level, "{}", message);
        } else {
            log::log!(target: Self::TARGET, level, "{} {}", message, data);
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _level: Level, _message: &str, _data: Value) {}
}

/// A recorded event
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub level: Level,
    pub message: String,
    pub data: Value,
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<RecordedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Events with the given message
    pub fn named(&self, message: &str) -> Vec<RecordedEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }

    pub fn count(&self, message: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.message == message)
            .count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&self, level: Level, message: &str, data: Value) {
        // A re-entrant emit while a snapshot is borrowed is dropped, not a panic
        if let Ok(mut events) = self.events.try_borrow_mut() {
            events.push(RecordedEvent {
                level,
                message: message.to_string(),
                data,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(Level::Info, "run_started", json!({ "difficulty": "easy" }));
        sink.emit(Level::Debug, "impulse", Value::Null);
        sink.emit(Level::Info, "run_started", json!({ "difficulty": "hard" }));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].message, "impulse");
        assert_eq!(sink.count("run_started"), 2);
        assert_eq!(sink.named("run_started")[1].data["difficulty"], "hard");

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_noop_and_log_sinks_accept_anything() {
        NoopSink.emit(Level::Error, "collision", json!({ "kind": "wall" }));
        LogSink.emit(Level::Warn, "invalid_transition", Value::Null);
        LogSink.emit(Level::Info, "screen_transition", json!({ "to": "menu" }));
    }
}
