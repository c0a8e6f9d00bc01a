//! Pipeline orchestration.
//!
//! This module provides:
//! - The [`Pipeline`] orchestrator and its builder
//! - The [`StageLedger`] accumulating one outcome per declared stage

mod integration_tests;
mod ledger;
mod orchestrator;

pub use ledger::StageLedger;
pub use orchestrator::{run_pipeline, Pipeline, PipelineBuilder};
