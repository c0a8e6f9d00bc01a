//! Testing utilities for herostory pipelines.
//!
//! This module provides:
//! - A scripted generator implementing every generative capability
//! - Assertions over the stage ledger of a [`PipelineResult`](crate::core::PipelineResult)

mod assertions;
mod mocks;

pub use assertions::{
    assert_all_complete_except, assert_halted, assert_ledger_well_formed, assert_stage_failed,
    assert_stage_status,
};
pub use mocks::{Script, ScriptedGenerator, DEFAULT_REPLY};
