//! Stage names, statuses and criticality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a stage failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    /// Failure is terminal for the whole pipeline.
    Critical,
    /// Failure is recorded and the run continues.
    Optional,
}

/// The declared stages of a hero story run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Story prose (critical gate).
    Story,
    /// Hero name extracted from the character.
    HeroName,
    /// Background illustration (prompt then render).
    BackgroundImage,
    /// Hero scene illustration (prompt then render).
    HeroImage,
    /// Instrumental soundtrack (prompt then compose).
    Music,
    /// Real-life analogy for the reader.
    Analogy,
}

impl StageName {
    /// All stages in declared order.
    pub const ALL: [Self; 6] = [
        Self::Story,
        Self::HeroName,
        Self::BackgroundImage,
        Self::HeroImage,
        Self::Music,
        Self::Analogy,
    ];

    /// Returns the stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::HeroName => "hero_name",
            Self::BackgroundImage => "background_image",
            Self::HeroImage => "hero_image",
            Self::Music => "music",
            Self::Analogy => "analogy",
        }
    }

    /// Returns the stage criticality. Only the story is critical.
    #[must_use]
    pub fn criticality(self) -> Criticality {
        match self {
            Self::Story => Criticality::Critical,
            _ => Criticality::Optional,
        }
    }

    /// Position in the declared order.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where a stage stands in the ledger.
///
/// Only `Pending` is non-terminal. A stage leaves it exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Not yet settled.
    #[default]
    Pending,
    /// Produced its value.
    Complete,
    /// Ran and failed; the error is recorded.
    Failed,
    /// Never ran because the story failed.
    Skipped,
}

impl StageStatus {
    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// True once the stage has settled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        *self != Self::Pending
    }

    /// True for `Complete`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        *self == Self::Complete
    }

    /// True for `Failed`. Skipped stages are not failures.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        *self == Self::Failed
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
