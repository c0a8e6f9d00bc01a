//! Stage functions.
//!
//! Each function turns already-produced values into one field of the
//! result. They own their inputs so the orchestrator can run each of them
//! on its own task under the stage deadline. Two-phase stages bound their
//! prompt phase separately with [`executor::run_generation`].

mod names;
pub mod prompts;

pub use names::{clean_hero_name, hero_name_or_fallback, FALLBACK_HERO_NAME};

use crate::config::StageDeadlines;
use crate::core::{Asset, AssetRole, GenerationRequest, StageName};
use crate::errors::GenerationError;
use crate::executor;
use crate::providers::{Generators, TextGenerator};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What every stage needs besides its inputs.
#[derive(Debug, Clone)]
pub struct StageEnv {
    /// Generative capabilities.
    pub generators: Generators,
    /// Stage deadlines.
    pub deadlines: StageDeadlines,
    /// Requested soundtrack length.
    pub music_length: Duration,
}

impl StageEnv {
    /// Creates a stage environment.
    #[must_use]
    pub fn new(generators: Generators, deadlines: StageDeadlines, music_length: Duration) -> Self {
        Self {
            generators,
            deadlines,
            music_length,
        }
    }

    /// Total deadline of a stage, including any prompt phase.
    #[must_use]
    pub fn deadline(&self, stage: StageName) -> Duration {
        match stage {
            StageName::Story => self.deadlines.story(),
            StageName::HeroName => self.deadlines.hero_name(),
            StageName::BackgroundImage => self.deadlines.background_image(),
            StageName::HeroImage => self.deadlines.hero_image(),
            StageName::Music => self.deadlines.music(),
            StageName::Analogy => self.deadlines.analogy(),
        }
    }

    fn prompt_deadline(&self, stage: StageName) -> Duration {
        self.deadlines.prompt().min(self.deadline(stage))
    }
}

fn non_blank(
    text: String,
    provider: &dyn TextGenerator,
    what: &str,
) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::no_content(
            provider.provider_name(),
            format!("blank {what}"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Writes the story. Blank text is a failure.
pub async fn write_story(
    env: StageEnv,
    request: Arc<GenerationRequest>,
) -> Result<String, GenerationError> {
    let text = env.generators.text;
    let reply = text
        .generate(&prompts::story(&request.character, &request.world))
        .await?;
    non_blank(reply, text.as_ref(), "story")
}

/// Extracts the hero's name, substituting [`FALLBACK_HERO_NAME`] for
/// unusable replies.
pub async fn name_hero(
    env: StageEnv,
    request: Arc<GenerationRequest>,
) -> Result<String, GenerationError> {
    let reply = env
        .generators
        .text
        .generate(&prompts::hero_name(&request.character))
        .await?;

    let name = hero_name_or_fallback(&reply);
    if name == FALLBACK_HERO_NAME {
        tracing::debug!(reply_len = reply.len(), "No usable hero name; using fallback");
    }
    Ok(name)
}

/// Describes, then renders, one illustration.
///
/// The description phase has its own deadline; a blank description fails
/// the stage before any image call is made.
pub async fn illustrate(
    env: StageEnv,
    role: AssetRole,
    request: Arc<GenerationRequest>,
    story: Arc<str>,
) -> Result<Asset, GenerationError> {
    let (stage, description_prompt) = match role {
        AssetRole::BackgroundImage => (
            StageName::BackgroundImage,
            prompts::background_description(&request.world, &story),
        ),
        AssetRole::HeroImage | AssetRole::Music => (
            StageName::HeroImage,
            prompts::hero_scene_description(&request.character, &story),
        ),
    };

    let text = env.generators.text.clone();
    let description = executor::run_generation(
        move || async move {
            let reply = text.generate(&description_prompt).await?;
            non_blank(reply, text.as_ref(), "illustration prompt")
        },
        env.prompt_deadline(stage),
    )
    .await?;

    tracing::debug!(%stage, prompt_len = description.len(), "Illustration prompt ready");
    env.generators
        .image
        .generate(&prompts::illustration(&description), role)
        .await
}

/// Describes, then composes, the soundtrack.
///
/// A failed or blank description falls back to a templated prompt.
pub async fn compose_soundtrack(
    env: StageEnv,
    request: Arc<GenerationRequest>,
) -> Result<Asset, GenerationError> {
    let text = env.generators.text.clone();
    let description_prompt = prompts::soundtrack_description(&request.world, &request.character);
    let started = Instant::now();

    let described = executor::run_generation(
        move || async move {
            let reply = text.generate(&description_prompt).await?;
            non_blank(reply, text.as_ref(), "soundtrack prompt")
        },
        env.prompt_deadline(StageName::Music),
    )
    .await;

    let prompt = match described {
        Ok(prompt) => prompt,
        Err(err) => {
            tracing::warn!(
                error = %err,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Soundtrack prompt unavailable; using template"
            );
            prompts::soundtrack_fallback(&request.world)
        }
    };

    env.generators.music.generate(&prompt, env.music_length).await
}

/// Draws real-life parallels from the story. Blank text is a failure.
pub async fn draw_analogy(
    env: StageEnv,
    hero_name: String,
    story: Arc<str>,
) -> Result<String, GenerationError> {
    let text = env.generators.text;
    let reply = text.generate(&prompts::analogy(&hero_name, &story)).await?;
    non_blank(reply, text.as_ref(), "analogy")
}
