//! Generative client facade.
//!
//! The pipeline only ever talks to three capability traits. Which service
//! backs each one is decided once, at construction time, by
//! [`Generators::from_config`].

mod audio;
#[cfg(feature = "http-providers")]
mod elevenlabs;
#[cfg(feature = "http-providers")]
mod gemini;
#[cfg(feature = "http-providers")]
mod http;
mod placeholder;

#[cfg(feature = "http-providers")]
pub use elevenlabs::ElevenLabsMusicClient;
#[cfg(feature = "http-providers")]
pub use gemini::{GeminiImageClient, GeminiTextClient};
pub use audio::{pcm16_to_wav, pcm_sample_rate};
pub use placeholder::{placeholder_png, silent_wav, PlaceholderGenerator};

use crate::blob::BlobStore;
use crate::config::HeroStoryConfig;
use crate::core::{Asset, AssetRole};
use crate::errors::GenerationError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Produces prose from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name used in diagnostics.
    fn provider_name(&self) -> &str;

    /// Returns the full response text, or a failure. Never partial text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Produces a stored image from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Provider name used in diagnostics.
    fn provider_name(&self) -> &str;

    /// Renders and stores an image for `role`.
    ///
    /// A successful response without image data is
    /// [`GenerationError::NoContent`], distinct from transport failures.
    async fn generate(&self, prompt: &str, role: AssetRole) -> Result<Asset, GenerationError>;
}

/// Produces a stored audio clip from a prompt.
#[async_trait]
pub trait MusicGenerator: Send + Sync {
    /// Provider name used in diagnostics.
    fn provider_name(&self) -> &str;

    /// Composes and stores `duration` of instrumental music.
    async fn generate(&self, prompt: &str, duration: Duration) -> Result<Asset, GenerationError>;
}

/// The three capabilities the pipeline depends on.
#[derive(Clone)]
pub struct Generators {
    /// Text capability.
    pub text: Arc<dyn TextGenerator>,
    /// Image capability.
    pub image: Arc<dyn ImageGenerator>,
    /// Music capability.
    pub music: Arc<dyn MusicGenerator>,
}

impl fmt::Debug for Generators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generators")
            .field("text", &self.text.provider_name())
            .field("image", &self.image.provider_name())
            .field("music", &self.music.provider_name())
            .finish()
    }
}

impl Generators {
    /// Creates a bundle from three separate implementations.
    #[must_use]
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        music: Arc<dyn MusicGenerator>,
    ) -> Self {
        Self { text, image, music }
    }

    /// Uses one implementation for all three capabilities.
    #[must_use]
    pub fn uniform<G>(generator: Arc<G>) -> Self
    where
        G: TextGenerator + ImageGenerator + MusicGenerator + 'static,
    {
        Self {
            text: generator.clone(),
            image: generator.clone(),
            music: generator,
        }
    }

    /// Builds the configured providers.
    ///
    /// Any capability without an API key falls back to the offline
    /// [`PlaceholderGenerator`].
    pub fn from_config(
        config: &HeroStoryConfig,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self, GenerationError> {
        let placeholder = Arc::new(PlaceholderGenerator::new(store.clone()));
        let mut generators = Self::uniform(placeholder);

        let providers = &config.providers;

        #[cfg(feature = "http-providers")]
        {
            if let Some(key) = providers.gemini.api_key.as_deref().filter(|k| !k.is_empty()) {
                generators.text = Arc::new(GeminiTextClient::new(&providers.gemini, key)?);
                generators.image =
                    Arc::new(GeminiImageClient::new(&providers.gemini, key, store.clone())?);
            } else {
                tracing::warn!("No Gemini API key configured; using placeholder text and images");
            }

            if let Some(key) = providers.elevenlabs.api_key.as_deref().filter(|k| !k.is_empty()) {
                let client = ElevenLabsMusicClient::new(&providers.elevenlabs, key, store)?
                    .with_output_format(config.music.output_format.clone());
                generators.music = Arc::new(client);
            } else {
                tracing::warn!("No ElevenLabs API key configured; using placeholder music");
            }
        }

        #[cfg(not(feature = "http-providers"))]
        {
            let _ = store;
            if providers.gemini.api_key.is_some() || providers.elevenlabs.api_key.is_some() {
                tracing::warn!("API keys configured but http-providers feature is disabled; using placeholders");
            }
        }

        tracing::info!(generators = ?generators, "Generative providers ready");
        Ok(generators)
    }
}
