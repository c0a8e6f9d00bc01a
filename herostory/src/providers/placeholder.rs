//! Offline stand-in used when no provider credentials are configured.

use super::audio::pcm16_to_wav;
use super::{ImageGenerator, MusicGenerator, TextGenerator};
use crate::blob::BlobStore;
use crate::core::{Asset, AssetRole};
use crate::errors::GenerationError;
use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "placeholder";

const PLACEHOLDER_TEXT: &str = "This is placeholder content generated without a text model.\n\n\
Set GEMINI_API_KEY to generate a real story, illustrations and analogy.";

const PLACEHOLDER_WIDTH: u32 = 320;
const PLACEHOLDER_HEIGHT: u32 = 240;
const WAV_SAMPLE_RATE: u32 = 8_000;

/// Deterministic generator for all three capabilities.
///
/// Text is a fixed notice, images are flat-colour PNGs and music is one
/// second of silence, all stored through the given blob store.
pub struct PlaceholderGenerator {
    store: Arc<dyn BlobStore>,
}

impl PlaceholderGenerator {
    /// Creates a generator storing its assets in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TextGenerator for PlaceholderGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok(PLACEHOLDER_TEXT.to_string())
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, _prompt: &str, role: AssetRole) -> Result<Asset, GenerationError> {
        let bytes = placeholder_png(role)?;
        Ok(self
            .store
            .store(bytes, role.file_stem(), role, "image/png")
            .await?)
    }
}

#[async_trait]
impl MusicGenerator for PlaceholderGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, _prompt: &str, _duration: Duration) -> Result<Asset, GenerationError> {
        Ok(self
            .store
            .store(silent_wav()?, AssetRole::Music.file_stem(), AssetRole::Music, "audio/wav")
            .await?)
    }
}

/// Encodes a flat-colour PNG whose tint depends on the role.
pub fn placeholder_png(role: AssetRole) -> Result<Vec<u8>, GenerationError> {
    let colour = match role {
        AssetRole::BackgroundImage => Rgb([0xf6, 0xec, 0xd2]),
        AssetRole::HeroImage | AssetRole::Music => Rgb([0xd2, 0xe4, 0xf6]),
    };
    let image = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, colour);

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| GenerationError::work(format!("placeholder encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// One second of 16-bit mono silence as a WAV file.
pub fn silent_wav() -> Result<Vec<u8>, GenerationError> {
    pcm16_to_wav(&vec![0u8; WAV_SAMPLE_RATE as usize * 2], WAV_SAMPLE_RATE)
}
