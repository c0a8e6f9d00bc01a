//! Pipeline lifecycle events.
//!
//! The orchestrator reports progress as [`PipelineEvent`]s to an
//! [`EventSink`]. The default sink writes them to `tracing`.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

use crate::core::StageName;
use crate::errors::FailureKind;
use serde_json::json;
use uuid::Uuid;

/// A lifecycle event of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// The request passed validation and the run began.
    PipelineStarted {
        /// Run identifier.
        run_id: Uuid,
    },
    /// A stage was handed to the executor.
    StageStarted {
        /// The stage.
        stage: StageName,
    },
    /// A stage produced its value.
    StageCompleted {
        /// The stage.
        stage: StageName,
        /// Time spent in the stage.
        duration_ms: i64,
    },
    /// A stage failed.
    StageFailed {
        /// The stage.
        stage: StageName,
        /// Failure kind.
        kind: FailureKind,
        /// Error message.
        error: String,
    },
    /// A stage never ran.
    StageSkipped {
        /// The stage.
        stage: StageName,
        /// Why it was skipped.
        reason: String,
    },
    /// The run finished with a story.
    PipelineCompleted {
        /// Run identifier.
        run_id: Uuid,
        /// Number of failed optional stages.
        failed_stages: usize,
        /// Wall-clock duration.
        duration_ms: f64,
    },
    /// The critical stage failed.
    PipelineFailed {
        /// Run identifier.
        run_id: Uuid,
        /// The fatal error.
        error: String,
    },
}

impl PipelineEvent {
    /// Dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline.started",
            Self::StageStarted { .. } => "stage.started",
            Self::StageCompleted { .. } => "stage.completed",
            Self::StageFailed { .. } => "stage.failed",
            Self::StageSkipped { .. } => "stage.skipped",
            Self::PipelineCompleted { .. } => "pipeline.completed",
            Self::PipelineFailed { .. } => "pipeline.failed",
        }
    }

    /// Event payload as JSON.
    #[must_use]
    pub fn data(&self) -> serde_json::Value {
        match self {
            Self::PipelineStarted { run_id } => json!({ "run_id": run_id }),
            Self::StageStarted { stage } => json!({ "stage": stage }),
            Self::StageCompleted { stage, duration_ms } => {
                json!({ "stage": stage, "duration_ms": duration_ms })
            }
            Self::StageFailed { stage, kind, error } => json!({
                "stage": stage,
                "criticality": stage.criticality(),
                "kind": kind,
                "error": error,
            }),
            Self::StageSkipped { stage, reason } => json!({ "stage": stage, "reason": reason }),
            Self::PipelineCompleted {
                run_id,
                failed_stages,
                duration_ms,
            } => json!({
                "run_id": run_id,
                "failed_stages": failed_stages,
                "duration_ms": duration_ms,
            }),
            Self::PipelineFailed { run_id, error } => json!({ "run_id": run_id, "error": error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        let run_id = Uuid::new_v4();
        assert_eq!(PipelineEvent::PipelineStarted { run_id }.event_type(), "pipeline.started");
        assert_eq!(
            PipelineEvent::StageFailed {
                stage: StageName::Music,
                kind: FailureKind::Provider,
                error: "HTTP 402".into(),
            }
            .event_type(),
            "stage.failed"
        );
    }

    #[test]
    fn test_failed_event_data() {
        let data = PipelineEvent::StageFailed {
            stage: StageName::HeroImage,
            kind: FailureKind::Timeout,
            error: "Deadline of 80000ms exceeded".into(),
        }
        .data();

        assert_eq!(data["stage"], "hero_image");
        assert_eq!(data["kind"], "timeout");
        assert_eq!(data["criticality"], "optional");
    }
}
