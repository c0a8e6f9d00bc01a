//! Test assertions for pipeline results.

use crate::core::{PipelineResult, StageName, StageStatus};
use crate::errors::FailureKind;

/// Asserts that a stage reached `expected`.
pub fn assert_stage_status(result: &PipelineResult, stage: StageName, expected: StageStatus) {
    let actual = result.stage(stage).map(|s| s.status);
    assert_eq!(
        actual,
        Some(expected),
        "Expected stage {stage} to be {expected:?}, got {actual:?}"
    );
}

/// Asserts that a stage failed with the given kind.
pub fn assert_stage_failed(result: &PipelineResult, stage: StageName, kind: FailureKind) {
    assert_stage_status(result, stage, StageStatus::Failed);
    let actual = result.stage(stage).and_then(|s| s.failure);
    assert_eq!(
        actual,
        Some(kind),
        "Expected stage {stage} to fail with {kind}, got {actual:?}"
    );
}

/// Asserts that every stage except `failed` completed.
pub fn assert_all_complete_except(result: &PipelineResult, failed: &[StageName]) {
    for stage in &result.stages {
        if failed.contains(&stage.name) {
            continue;
        }
        assert_eq!(
            stage.status,
            StageStatus::Complete,
            "Expected stage {} to be complete, got {:?} ({:?})",
            stage.name,
            stage.status,
            stage.error
        );
    }
}

/// Asserts the ledger shape every run must have: one terminal entry per
/// declared stage, in declared order.
pub fn assert_ledger_well_formed(result: &PipelineResult) {
    let names: Vec<StageName> = result.stages.iter().map(|s| s.name).collect();
    assert_eq!(names, StageName::ALL.to_vec(), "Ledger is not in declared order");

    for stage in &result.stages {
        assert!(
            stage.status.is_terminal(),
            "Stage {} is not terminal: {:?}",
            stage.name,
            stage.status
        );
    }

    assert!(result.images.len() <= 2, "More than two images: {}", result.images.len());
    if result.images.len() == 2 {
        assert!(
            result.images[0].role == crate::core::AssetRole::BackgroundImage,
            "Background image must come first"
        );
    }
}

/// Asserts the shape of a run whose critical stage failed.
pub fn assert_halted(result: &PipelineResult) {
    assert!(result.fatal_error.is_some(), "Expected fatal_error to be set");
    assert!(result.story.is_none(), "Halted run must not carry a story");
    assert_stage_status(result, StageName::Story, StageStatus::Failed);
    for stage in result.stages.iter().filter(|s| s.name != StageName::Story) {
        assert_eq!(
            stage.status,
            StageStatus::Skipped,
            "Expected stage {} to be skipped after halt",
            stage.name
        );
    }
}
