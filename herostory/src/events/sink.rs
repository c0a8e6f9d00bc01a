//! Event sinks.

use super::PipelineEvent;
use crate::core::StageName;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

/// Receives pipeline lifecycle events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event, e.g. `stage.failed` with its JSON data.
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Emits an event without awaiting. Never fails.
    fn try_emit(&self, event_type: &str, data: Option<Value>);

    /// Emits a typed pipeline event.
    fn record(&self, event: &PipelineEvent) {
        self.try_emit(event.event_type(), Some(event.data()));
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Writes events to `tracing`.
///
/// `*.failed` and `*.skipped` log at `warn`, completions at `info`, and
/// `*.started` at `debug` unless the sink is verbose.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink {
    verbose: bool,
}

impl LoggingEventSink {
    /// Also logs `*.started` events at `info`.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    fn log(self, event_type: &str, data: Option<&Value>) {
        let stage = data.and_then(|d| d.get("stage")).and_then(Value::as_str).unwrap_or("-");
        let data = data.map(Value::to_string).unwrap_or_default();

        if event_type.ends_with(".failed") || event_type.ends_with(".skipped") {
            tracing::warn!(event_type, stage, %data, "Pipeline event");
        } else if event_type.ends_with(".started") && !self.verbose {
            tracing::debug!(event_type, stage, %data, "Pipeline event");
        } else {
            tracing::info!(event_type, stage, %data, "Pipeline event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.log(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.log(event_type, data.as_ref());
    }
}

/// One event kept by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Dotted type, e.g. `stage.completed`.
    pub event_type: String,
    /// Payload, `Null` when none was given.
    pub data: Value,
}

impl RecordedEvent {
    /// The stage named in the payload, if any.
    #[must_use]
    pub fn stage(&self) -> Option<StageName> {
        serde_json::from_value(self.data.get("stage")?.clone()).ok()
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event_type: &str, data: Option<Value>) {
        self.events.lock().push(RecordedEvent {
            event_type: event_type.to_string(),
            data: data.unwrap_or(Value::Null),
        });
    }

    /// All events so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Event types in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Number of events of exactly `event_type`.
    #[must_use]
    pub fn count(&self, event_type: &str) -> usize {
        self.events.lock().iter().filter(|e| e.event_type == event_type).count()
    }

    /// Stages reported by events of `event_type`, in emission order.
    #[must_use]
    pub fn stages(&self, event_type: &str) -> Vec<StageName> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type == event_type)
            .filter_map(RecordedEvent::stage)
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.push(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.push(event_type, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_noop_and_logging_sinks_accept_everything() {
        let failed = PipelineEvent::StageFailed {
            stage: StageName::Music,
            kind: FailureKind::Timeout,
            error: "Deadline of 90000ms exceeded".into(),
        };
        NoOpEventSink.record(&failed);
        NoOpEventSink.emit("pipeline.started", None).await;

        LoggingEventSink::default().record(&failed);
        LoggingEventSink::verbose().record(&PipelineEvent::StageStarted {
            stage: StageName::Story,
        });
        LoggingEventSink::default().emit("pipeline.completed", None).await;
    }

    #[tokio::test]
    async fn test_collecting_sink_keeps_order_and_payloads() {
        let sink = CollectingEventSink::new();
        sink.emit("pipeline.started", None).await;
        sink.record(&PipelineEvent::StageStarted {
            stage: StageName::Story,
        });
        sink.record(&PipelineEvent::StageSkipped {
            stage: StageName::Analogy,
            reason: "story failed".into(),
        });

        assert_eq!(
            sink.event_types(),
            vec!["pipeline.started", "stage.started", "stage.skipped"]
        );
        assert_eq!(sink.events()[0].data, Value::Null);
        assert_eq!(sink.events()[2].data["reason"], "story failed");
        assert_eq!(sink.count("stage.started"), 1);
        assert_eq!(sink.count("stage."), 0);
        assert_eq!(sink.stages("stage.skipped"), vec![StageName::Analogy]);
    }
}
