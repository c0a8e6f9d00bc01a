//! The hero story orchestrator.

use super::StageLedger;
use crate::config::{ExecutionMode, HeroStoryConfig, StageDeadlines};
use crate::core::{
    Asset, AssetRole, Criticality, GenerationRequest, PipelineResult, StageName, StagePayload,
    StageResult,
};
use crate::errors::{GenerationError, HeroStoryError};
use crate::events::{EventSink, LoggingEventSink, PipelineEvent};
use crate::executor;
use crate::markup;
use crate::providers::Generators;
use crate::stages::{self, StageEnv, FALLBACK_HERO_NAME};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

const DEFAULT_MUSIC_LENGTH: Duration = Duration::from_secs(30);

/// Values a stage can leave in the ledger.
trait LedgerPayload {
    fn payload(&self) -> StagePayload;
}

impl LedgerPayload for String {
    fn payload(&self) -> StagePayload {
        StagePayload::Text(self.clone())
    }
}

impl LedgerPayload for Asset {
    fn payload(&self) -> StagePayload {
        StagePayload::Asset(self.clone())
    }
}

/// Runs the story gate, then the optional branches, and aggregates the
/// outcome of every declared stage.
pub struct Pipeline {
    env: StageEnv,
    mode: ExecutionMode,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("env", &self.env)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Starts building a pipeline around `generators`.
    #[must_use]
    pub fn builder(generators: Generators) -> PipelineBuilder {
        PipelineBuilder::new(generators)
    }

    /// Builds a pipeline from configuration.
    #[must_use]
    pub fn from_config(config: &HeroStoryConfig, generators: Generators) -> Self {
        Self::builder(generators)
            .with_deadlines(config.deadlines)
            .with_mode(config.execution.mode)
            .with_music_length(config.music.length())
            .build()
    }

    /// Returns the execution mode.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Executes one run.
    ///
    /// Returns `Err` only for invalid input, before any generator is
    /// called. A failed story yields `Ok` with `fatal_error` set.
    pub async fn run(&self, request: GenerationRequest) -> Result<PipelineResult, HeroStoryError> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", %run_id, mode = ?self.mode);
        Ok(self.execute(run_id, request).instrument(span).await)
    }

    async fn execute(&self, run_id: Uuid, request: GenerationRequest) -> PipelineResult {
        let started = Instant::now();
        let request = Arc::new(request);
        let ledger = StageLedger::new();
        self.events.record(&PipelineEvent::PipelineStarted { run_id });

        let story = match self
            .run_stage(
                &ledger,
                StageName::Story,
                stages::write_story(self.env.clone(), request.clone()),
            )
            .await
        {
            Ok(story) => story,
            Err(err) => return self.halt(run_id, &ledger, &request, StageName::Story, &err, started),
        };

        let story: Arc<str> = Arc::from(story);

        let name_then_analogy = async {
            let name = self
                .run_stage(
                    &ledger,
                    StageName::HeroName,
                    stages::name_hero(self.env.clone(), request.clone()),
                )
                .await
                .ok();
            let analogy_subject = name.clone().unwrap_or_else(|| FALLBACK_HERO_NAME.to_string());
            let analogy = self
                .run_stage(
                    &ledger,
                    StageName::Analogy,
                    stages::draw_analogy(self.env.clone(), analogy_subject, story.clone()),
                )
                .await
                .ok();
            (name, analogy)
        };
        let background = self.run_stage(
            &ledger,
            StageName::BackgroundImage,
            stages::illustrate(self.env.clone(), AssetRole::BackgroundImage, request.clone(), story.clone()),
        );
        let hero = self.run_stage(
            &ledger,
            StageName::HeroImage,
            stages::illustrate(self.env.clone(), AssetRole::HeroImage, request.clone(), story.clone()),
        );
        let music = self.run_stage(
            &ledger,
            StageName::Music,
            stages::compose_soundtrack(self.env.clone(), request.clone()),
        );

        let ((hero_name, analogy), background, hero, music) = match self.mode {
            ExecutionMode::Concurrent => futures::join!(name_then_analogy, background, hero, music),
            ExecutionMode::Sequential => {
                let names = name_then_analogy.await;
                (names, background.await, hero.await, music.await)
            }
        };

        // Background first, whatever finished first.
        let images: Vec<Asset> = [background.ok(), hero.ok()].into_iter().flatten().collect();

        let stages = ledger.seal();
        let failed_stages = stages.iter().filter(|s| s.status.is_failure()).count();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.events.record(&PipelineEvent::PipelineCompleted {
            run_id,
            failed_stages,
            duration_ms,
        });
        tracing::info!(failed_stages, duration_ms, "Pipeline completed");

        PipelineResult {
            run_id,
            request: (*request).clone(),
            story_markup: Some(markup::to_html(&story)),
            story: Some(story.to_string()),
            hero_name,
            images,
            audio: music.ok(),
            analogy_markup: analogy.as_deref().map(markup::to_html),
            analogy,
            stages,
            fatal_error: None,
            duration_ms,
        }
    }

    /// Runs one stage under its deadline and records the outcome.
    async fn run_stage<T, Fut>(
        &self,
        ledger: &StageLedger,
        stage: StageName,
        work: Fut,
    ) -> Result<T, GenerationError>
    where
        T: LedgerPayload + Send + 'static,
        Fut: Future<Output = Result<T, GenerationError>> + Send + 'static,
    {
        let deadline = self.env.deadline(stage);
        let started_at = Utc::now();
        self.events.record(&PipelineEvent::StageStarted { stage });
        tracing::debug!(%stage, deadline_ms = deadline.as_millis() as u64, "Stage started");

        let outcome = executor::run_generation(move || work, deadline).await;

        match &outcome {
            Ok(value) => {
                let entry = StageResult::complete(stage, started_at, value.payload());
                let duration_ms = entry.duration_ms().unwrap_or_default();
                if ledger.record(entry) {
                    self.events.record(&PipelineEvent::StageCompleted { stage, duration_ms });
                    tracing::info!(%stage, duration_ms, "Stage completed");
                }
            }
            Err(err) => {
                if ledger.record(StageResult::failed(stage, started_at, err)) {
                    self.events.record(&PipelineEvent::StageFailed {
                        stage,
                        kind: err.kind(),
                        error: err.to_string(),
                    });
                    match stage.criticality() {
                        Criticality::Critical => {
                            tracing::error!(%stage, kind = %err.kind(), error = %err, "Critical stage failed");
                        }
                        Criticality::Optional => {
                            tracing::warn!(%stage, kind = %err.kind(), error = %err, "Optional stage failed; continuing");
                        }
                    }
                }
            }
        }
        outcome
    }

    fn halt(
        &self,
        run_id: Uuid,
        ledger: &StageLedger,
        request: &GenerationRequest,
        stage: StageName,
        err: &GenerationError,
        started: Instant,
    ) -> PipelineResult {
        debug_assert_eq!(stage.criticality(), Criticality::Critical);
        let reason = format!("{stage} failed");
        for stage in ledger.skip_pending(&reason) {
            self.events.record(&PipelineEvent::StageSkipped {
                stage,
                reason: reason.clone(),
            });
        }

        let fatal = format!("Story generation failed: {err}");
        self.events.record(&PipelineEvent::PipelineFailed {
            run_id,
            error: fatal.clone(),
        });
        tracing::error!(%stage, error = %err, "Halting pipeline");

        PipelineResult {
            run_id,
            request: request.clone(),
            story: None,
            story_markup: None,
            hero_name: None,
            images: Vec::new(),
            audio: None,
            analogy: None,
            analogy_markup: None,
            stages: ledger.seal(),
            fatal_error: Some(fatal),
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    generators: Generators,
    deadlines: StageDeadlines,
    mode: ExecutionMode,
    music_length: Duration,
    events: Arc<dyn EventSink>,
}

impl PipelineBuilder {
    /// Creates a builder with default deadlines and concurrent branches.
    #[must_use]
    pub fn new(generators: Generators) -> Self {
        Self {
            generators,
            deadlines: StageDeadlines::default(),
            mode: ExecutionMode::default(),
            music_length: DEFAULT_MUSIC_LENGTH,
            events: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Sets the stage deadlines.
    #[must_use]
    pub fn with_deadlines(mut self, deadlines: StageDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Sets how optional branches are scheduled.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the requested soundtrack length.
    #[must_use]
    pub fn with_music_length(mut self, length: Duration) -> Self {
        self.music_length = length;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            env: StageEnv::new(self.generators, self.deadlines, self.music_length),
            mode: self.mode,
            events: self.events,
        }
    }
}

/// Runs `pipeline` for one character and world.
pub async fn run_pipeline(
    pipeline: &Pipeline,
    character: impl Into<String>,
    world: impl Into<String>,
) -> Result<PipelineResult, HeroStoryError> {
    pipeline.run(GenerationRequest::new(character, world)).await
}
