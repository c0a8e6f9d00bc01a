//! # Herostory
//!
//! Orchestrates unreliable generative services into an illustrated hero
//! story: prose, a hero name, two illustrations, an instrumental
//! soundtrack, a real-life analogy, and finally a PDF keepsake.
//!
//! - **Story gate**: the story must succeed; every other stage is optional
//! - **Bounded calls**: each external call runs on its own task under a deadline
//! - **Failure isolation**: optional failures are recorded, never propagated
//! - **Stage ledger**: one outcome per declared stage, in declared order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herostory::prelude::*;
//!
//! let config = HeroStoryConfig::from_env()?;
//! let store = Arc::new(
//!     FsBlobStore::open(&config.storage.output_dir).await?
//!         .with_url_prefix(&config.storage.url_prefix),
//! );
//! let generators = Generators::from_config(&config, store.clone())?;
//! let pipeline = Pipeline::from_config(&config, generators);
//!
//! let result = run_pipeline(&pipeline, character, world).await?;
//! let payload = DocumentPayload::from(&result);
//! let pdf = assemble_document(&payload, store.as_ref(), &DocumentOptions::from_config(&config)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod blob;
pub mod config;
pub mod core;
pub mod document;
pub mod errors;
pub mod events;
pub mod executor;
pub mod intake;
pub mod markup;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::blob::{BlobStore, FsBlobStore, InMemoryBlobStore};
    pub use crate::config::{ExecutionMode, HeroStoryConfig, StageDeadlines};
    pub use crate::core::{
        Asset, AssetRole, GenerationRequest, PipelineResult, StageName, StageResult,
        StageStatus,
    };
    pub use crate::document::{assemble_document, DocumentOptions, DocumentPayload};
    pub use crate::errors::{FailureKind, GenerationError, HeroStoryError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
    pub use crate::intake::{DetectedTopic, IntakeComposer};
    pub use crate::pipeline::{run_pipeline, Pipeline, PipelineBuilder};
    pub use crate::providers::{Generators, ImageGenerator, MusicGenerator, TextGenerator};
}
