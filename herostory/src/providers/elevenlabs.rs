//! ElevenLabs music client.

use super::audio::{pcm16_to_wav, pcm_sample_rate};
use super::{http, MusicGenerator};
use crate::blob::BlobStore;
use crate::config::ElevenLabsConfig;
use crate::core::{Asset, AssetRole};
use crate::errors::GenerationError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const PROVIDER: &str = "elevenlabs";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

#[derive(Debug, Serialize)]
struct MusicRequest<'a> {
    prompt: &'a str,
    music_length_ms: u64,
    force_instrumental: bool,
}

/// Instrumental music through `POST /v1/music`.
pub struct ElevenLabsMusicClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    output_format: String,
    store: Arc<dyn BlobStore>,
}

impl ElevenLabsMusicClient {
    /// Creates a client storing clips in `store`.
    pub fn new(
        config: &ElevenLabsConfig,
        api_key: &str,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http::client(PROVIDER, config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            output_format: OUTPUT_FORMAT.to_string(),
            store,
        })
    }

    /// Overrides the output format (e.g. `mp3_22050_32`).
    #[must_use]
    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    /// Turns a response body into storable bytes and their media type.
    ///
    /// `pcm_*` bodies are headerless 16-bit mono samples and get a WAV
    /// container.
    fn package(&self, body: Vec<u8>) -> Result<(Vec<u8>, &'static str), GenerationError> {
        if let Some(rate) = pcm_sample_rate(&self.output_format) {
            return Ok((pcm16_to_wav(&body, rate)?, "audio/wav"));
        }
        let media_type = if self.output_format.starts_with("mp3") {
            "audio/mpeg"
        } else {
            "application/octet-stream"
        };
        Ok((body, media_type))
    }
}

#[async_trait]
impl MusicGenerator for ElevenLabsMusicClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str, duration: Duration) -> Result<Asset, GenerationError> {
        let body = MusicRequest {
            prompt,
            music_length_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            force_instrumental: true,
        };

        let response = self
            .client
            .post(format!("{}/v1/music", self.endpoint))
            .header("xi-api-key", &self.api_key)
            .query(&[("output_format", self.output_format.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error(PROVIDER, e))?;

        let bytes = http::ensure_success(PROVIDER, response)
            .await?
            .bytes()
            .await
            .map_err(|e| http::transport_error(PROVIDER, e))?;
        if bytes.is_empty() {
            return Err(GenerationError::no_content(PROVIDER, "empty audio body"));
        }

        let (bytes, media_type) = self.package(bytes.to_vec())?;
        let asset = self
            .store
            .store(bytes, AssetRole::Music.file_stem(), AssetRole::Music, media_type)
            .await?;
        tracing::debug!(reference = %asset.reference, bytes = asset.byte_len, "Stored soundtrack");
        Ok(asset)
    }
}
