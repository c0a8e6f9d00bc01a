//! Per-stage results and the aggregate pipeline result.

use super::{Asset, AssetRole, GenerationRequest, StageName, StageStatus};
use crate::errors::{FailureKind, GenerationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value produced by a completed stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StagePayload {
    /// Generated prose.
    Text(String),
    /// Stored binary asset.
    Asset(Asset),
}

impl StagePayload {
    /// Returns the text, if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Asset(_) => None,
        }
    }

    /// Returns the asset, if this is an asset payload.
    #[must_use]
    pub fn as_asset(&self) -> Option<&Asset> {
        match self {
            Self::Asset(asset) => Some(asset),
            Self::Text(_) => None,
        }
    }
}

/// Ledger entry for one declared stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage name.
    pub name: StageName,
    /// Stage status.
    pub status: StageStatus,
    /// Produced value, for completed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<StagePayload>,
    /// Error message, for failed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Typed failure kind, for failed stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Why the stage was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// When the stage started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage reached its terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl StageResult {
    /// Creates a pending entry.
    #[must_use]
    pub fn pending(name: StageName) -> Self {
        Self {
            name,
            status: StageStatus::Pending,
            payload: None,
            error: None,
            failure: None,
            skip_reason: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Creates a completed entry.
    #[must_use]
    pub fn complete(name: StageName, started_at: DateTime<Utc>, payload: StagePayload) -> Self {
        Self {
            status: StageStatus::Complete,
            payload: Some(payload),
            started_at: Some(started_at),
            ended_at: Some(Utc::now()),
            ..Self::pending(name)
        }
    }

    /// Creates a failed entry.
    #[must_use]
    pub fn failed(name: StageName, started_at: DateTime<Utc>, error: &GenerationError) -> Self {
        Self {
            status: StageStatus::Failed,
            error: Some(error.to_string()),
            failure: Some(error.kind()),
            started_at: Some(started_at),
            ended_at: Some(Utc::now()),
            ..Self::pending(name)
        }
    }

    /// Creates a skipped entry.
    #[must_use]
    pub fn skipped(name: StageName, reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skipped,
            skip_reason: Some(reason.into()),
            ended_at: Some(Utc::now()),
            ..Self::pending(name)
        }
    }

    /// Returns the duration in milliseconds, when the stage actually ran.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    /// Returns the payload text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.payload.as_ref().and_then(StagePayload::as_text)
    }

    /// Returns the payload asset, if any.
    #[must_use]
    pub fn asset(&self) -> Option<&Asset> {
        self.payload.as_ref().and_then(StagePayload::as_asset)
    }
}

/// Aggregate of one pipeline run.
///
/// This is the only value that crosses from the pipeline to the document
/// assembler (or to a caller serializing it as JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// The request the run consumed.
    pub request: GenerationRequest,
    /// Story prose.
    pub story: Option<String>,
    /// Story rendered as HTML paragraphs.
    pub story_markup: Option<String>,
    /// Extracted hero name.
    pub hero_name: Option<String>,
    /// Illustrations, background before hero scene.
    pub images: Vec<Asset>,
    /// Soundtrack.
    pub audio: Option<Asset>,
    /// Motivational analogy.
    pub analogy: Option<String>,
    /// Analogy rendered as HTML paragraphs.
    pub analogy_markup: Option<String>,
    /// One entry per declared stage, in declared order.
    pub stages: Vec<StageResult>,
    /// Set when the critical stage failed.
    pub fatal_error: Option<String>,
    /// Wall-clock duration of the run.
    pub duration_ms: f64,
}

impl PipelineResult {
    /// Returns true if the critical stage succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.fatal_error.is_none()
    }

    /// Returns the ledger entry for a stage.
    #[must_use]
    pub fn stage(&self, name: StageName) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the names of failed stages, in declared order.
    #[must_use]
    pub fn failed_stages(&self) -> Vec<StageName> {
        self.stages
            .iter()
            .filter(|s| s.status.is_failure())
            .map(|s| s.name)
            .collect()
    }

    /// Returns the background image, if generated.
    #[must_use]
    pub fn background_image(&self) -> Option<&Asset> {
        self.image_with_role(AssetRole::BackgroundImage)
    }

    /// Returns the hero scene image, if generated.
    #[must_use]
    pub fn hero_image(&self) -> Option<&Asset> {
        self.image_with_role(AssetRole::HeroImage)
    }

    fn image_with_role(&self, role: AssetRole) -> Option<&Asset> {
        self.images.iter().find(|a| a.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_result_complete() {
        let started = Utc::now();
        let result = StageResult::complete(
            StageName::HeroName,
            started,
            StagePayload::Text("Ren".to_string()),
        );

        assert_eq!(result.status, StageStatus::Complete);
        assert_eq!(result.text(), Some("Ren"));
        assert!(result.error.is_none());
        assert!(result.duration_ms().is_some());
    }

    #[test]
    fn test_stage_result_failed_records_kind() {
        let err = GenerationError::no_content("gemini-image", "no inline image");
        let result = StageResult::failed(StageName::HeroImage, Utc::now(), &err);

        assert_eq!(result.status, StageStatus::Failed);
        assert_eq!(result.failure, Some(FailureKind::NoContent));
        assert!(result.error.as_deref().unwrap().contains("no inline image"));
        assert!(result.asset().is_none());
    }

    #[test]
    fn test_stage_result_skipped_has_no_duration() {
        let result = StageResult::skipped(StageName::Music, "story failed");
        assert_eq!(result.status, StageStatus::Skipped);
        assert_eq!(result.duration_ms(), None);
    }

    #[test]
    fn test_payload_serialization_is_tagged() {
        let payload = StagePayload::Text("hello".to_string());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"type": "text", "value": "hello"}));
    }
}
