//! Core domain model types for herostory.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage names, statuses and criticality
//! - Assets produced by generative stages
//! - The generation request and the aggregate pipeline result

mod asset;
mod request;
mod result;
mod status;

pub use asset::{content_digest, extension_for, Asset, AssetRole};
pub use request::GenerationRequest;
pub use result::{PipelineResult, StagePayload, StageResult};
pub use status::{Criticality, StageName, StageStatus};
