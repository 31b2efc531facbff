//! Unified event bus — trait for emitting pipeline events from any module.
//!
//! Components accept an `Arc<dyn EventSink>` to emit generation outcomes,
//! fallback decisions, and experiment exposures into the monitoring pipeline.

use crate::types::{MessageCategory, NotifyEvent, NotifyEventType};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Trait for emitting pipeline events. Implementations route events to the
/// host application's analytics/monitoring backend.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: NotifyEvent);
}

/// No-op sink for modules that don't need event emission.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: NotifyEvent) {}
}

pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<NotifyEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_type(&self, event_type: NotifyEventType) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event bus mutex poisoned").clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: NotifyEvent) {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .push(event);
    }
}

/// Convenience constructor for a pipeline event.
pub fn make_event(
    event_type: NotifyEventType,
    user_id: Option<String>,
    message_type: Option<MessageCategory>,
    template_id: Option<Uuid>,
    detail: Option<String>,
) -> NotifyEvent {
    NotifyEvent {
        event_id: Uuid::new_v4(),
        event_type,
        user_id,
        message_type,
        template_id,
        detail,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sink_counts_by_type() {
        let sink = CaptureSink::new();
        sink.emit(make_event(
            NotifyEventType::MessageGenerated,
            Some("u1".to_string()),
            Some(MessageCategory::Session),
            None,
            None,
        ));
        sink.emit(make_event(
            NotifyEventType::FallbackTriggered,
            Some("u1".to_string()),
            None,
            None,
            Some("optimized mode failed".to_string()),
        ));

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.count_type(NotifyEventType::MessageGenerated), 1);
        assert_eq!(sink.count_type(NotifyEventType::VariantAssigned), 0);

        sink.clear();
        assert_eq!(sink.count(), 0);
    }
}
