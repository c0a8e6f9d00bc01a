//! Declared-order stage ledger.

use crate::core::{StageName, StageResult, StageStatus};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Accumulates exactly one terminal [`StageResult`] per declared stage.
///
/// The first terminal write for a stage wins. Later writes, and any write
/// after [`StageLedger::seal`], are refused and logged, so a result that
/// arrives after its stage was finalized cannot change the ledger.
#[derive(Debug)]
pub struct StageLedger {
    entries: RwLock<Vec<StageResult>>,
    sealed: AtomicBool,
}

impl Default for StageLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl StageLedger {
    /// Creates a ledger with every declared stage pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(StageName::ALL.iter().map(|s| StageResult::pending(*s)).collect()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Records a terminal outcome. Returns false if the write was refused.
    pub fn record(&self, result: StageResult) -> bool {
        if !result.status.is_terminal() {
            tracing::warn!(stage = %result.name, "Refusing non-terminal ledger write");
            return false;
        }
        if self.sealed.load(Ordering::SeqCst) {
            tracing::warn!(stage = %result.name, status = ?result.status, "Refusing write to sealed ledger");
            return false;
        }

        let mut entries = self.entries.write();
        let entry = &mut entries[result.name.index()];
        if entry.status.is_terminal() {
            tracing::warn!(
                stage = %result.name,
                existing = ?entry.status,
                refused = ?result.status,
                "Refusing second terminal write for stage"
            );
            return false;
        }
        *entry = result;
        true
    }

    /// Marks every still-pending stage as skipped. Returns the skipped names.
    pub fn skip_pending(&self, reason: &str) -> Vec<StageName> {
        let pending: Vec<StageName> = self
            .entries
            .read()
            .iter()
            .filter(|e| e.status == StageStatus::Pending)
            .map(|e| e.name)
            .collect();

        pending
            .into_iter()
            .filter(|name| self.record(StageResult::skipped(*name, reason)))
            .collect()
    }

    /// Returns the current entry for a stage.
    #[must_use]
    pub fn get(&self, stage: StageName) -> StageResult {
        self.entries.read()[stage.index()].clone()
    }

    /// Returns true once every stage is terminal.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.read().iter().all(|e| e.status.is_terminal())
    }

    /// Refuses all further writes and returns the entries in declared order.
    pub fn seal(&self) -> Vec<StageResult> {
        self.sealed.store(true, Ordering::SeqCst);
        self.entries.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StagePayload;
    use crate::errors::GenerationError;
    use chrono::Utc;

    fn complete(name: StageName, text: &str) -> StageResult {
        StageResult::complete(name, Utc::now(), StagePayload::Text(text.to_string()))
    }

    #[test]
    fn test_new_ledger_is_pending_in_declared_order() {
        let ledger = StageLedger::new();
        let entries = ledger.seal();

        let names: Vec<StageName> = entries.iter().map(|e| e.name).collect();
        assert_eq!(names, StageName::ALL.to_vec());
        assert!(entries.iter().all(|e| e.status == StageStatus::Pending));
    }

    #[test]
    fn test_first_terminal_write_wins() {
        let ledger = StageLedger::new();
        let timeout = GenerationError::Timeout {
            deadline: std::time::Duration::from_secs(80),
        };

        assert!(ledger.record(StageResult::failed(StageName::HeroImage, Utc::now(), &timeout)));
        assert!(!ledger.record(complete(StageName::HeroImage, "late")));

        let entry = ledger.get(StageName::HeroImage);
        assert_eq!(entry.status, StageStatus::Failed);
        assert!(entry.payload.is_none());
    }

    #[test]
    fn test_sealed_ledger_refuses_writes() {
        let ledger = StageLedger::new();
        ledger.seal();

        assert!(!ledger.record(complete(StageName::Analogy, "late")));
        assert_eq!(ledger.get(StageName::Analogy).status, StageStatus::Pending);
    }

    #[test]
    fn test_non_terminal_write_refused() {
        let ledger = StageLedger::new();
        assert!(!ledger.record(StageResult::pending(StageName::Music)));
    }

    #[test]
    fn test_skip_pending() {
        let ledger = StageLedger::new();
        ledger.record(complete(StageName::Story, "once"));

        let skipped = ledger.skip_pending("story failed");

        assert_eq!(skipped.len(), 5);
        assert!(!skipped.contains(&StageName::Story));
        assert!(ledger.is_complete());
        assert_eq!(
            ledger.get(StageName::Music).skip_reason.as_deref(),
            Some("story failed")
        );
    }
}
