//! Gemini text and image clients.

use super::{http, ImageGenerator, TextGenerator};
use crate::blob::BlobStore;
use crate::config::GeminiConfig;
use crate::core::{Asset, AssetRole};
use crate::errors::GenerationError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const TEXT_PROVIDER: &str = "gemini";
const IMAGE_PROVIDER: &str = "gemini-image";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Shared HTTP plumbing for both clients.
struct GeminiHttp {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiHttp {
    fn new(config: &GeminiConfig, api_key: &str, provider: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            client: http::client(provider, config.timeout_secs)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn build_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, model)
    }

    async fn generate(
        &self,
        provider: &str,
        model: &str,
        body: &GenerateRequest,
    ) -> Result<Vec<ResponsePart>, GenerationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| GenerationError::provider(provider, "API key is not a valid header value"))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let response = self
            .client
            .post(self.build_url(model))
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| http::transport_error(provider, e))?;

        let parsed: GenerateResponse = http::ensure_success(provider, response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::provider(provider, format!("invalid response: {}", e.without_url())))?;

        first_candidate_parts(provider, parsed)
    }
}

/// Parts of the first candidate; an in-body error is a provider failure.
fn first_candidate_parts(
    provider: &str,
    response: GenerateResponse,
) -> Result<Vec<ResponsePart>, GenerationError> {
    if let Some(error) = response.error {
        return Err(GenerationError::provider(provider, error.message));
    }
    Ok(response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default())
}

/// Concatenated text parts. Blank text is returned as-is; the stage
/// decides whether that is fatal.
fn joined_text(parts: Vec<ResponsePart>) -> String {
    parts.into_iter().filter_map(|p| p.text).collect()
}

/// Decoded bytes and media type of the first inline image part.
fn inline_image(parts: Vec<ResponsePart>) -> Result<(Vec<u8>, String), GenerationError> {
    let inline = parts
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| GenerationError::no_content(IMAGE_PROVIDER, "no image returned"))?;

    let bytes = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
        GenerationError::provider(IMAGE_PROVIDER, format!("invalid image data: {e}"))
    })?;
    if bytes.is_empty() {
        return Err(GenerationError::no_content(IMAGE_PROVIDER, "empty image data"));
    }
    Ok((bytes, inline.mime_type))
}

fn user_content(prompt: &str) -> Vec<Content> {
    vec![Content {
        role: "user".to_string(),
        parts: vec![RequestPart {
            text: prompt.to_string(),
        }],
    }]
}

/// Text generation through Gemini `generateContent`.
pub struct GeminiTextClient {
    http: GeminiHttp,
    model: String,
}

impl GeminiTextClient {
    /// Creates a client for the configured text model.
    pub fn new(config: &GeminiConfig, api_key: &str) -> Result<Self, GenerationError> {
        Ok(Self {
            http: GeminiHttp::new(config, api_key, TEXT_PROVIDER)?,
            model: config.text_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    fn provider_name(&self) -> &str {
        TEXT_PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: user_content(prompt),
            generation_config: None,
        };
        let parts = self.http.generate(TEXT_PROVIDER, &self.model, &body).await?;
        Ok(joined_text(parts))
    }
}

/// Image generation through Gemini `generateContent` with image output.
pub struct GeminiImageClient {
    http: GeminiHttp,
    model: String,
    store: Arc<dyn BlobStore>,
}

impl GeminiImageClient {
    /// Creates a client for the configured image model.
    pub fn new(
        config: &GeminiConfig,
        api_key: &str,
        store: Arc<dyn BlobStore>,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            http: GeminiHttp::new(config, api_key, IMAGE_PROVIDER)?,
            model: config.image_model.clone(),
            store,
        })
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    fn provider_name(&self) -> &str {
        IMAGE_PROVIDER
    }

    async fn generate(&self, prompt: &str, role: AssetRole) -> Result<Asset, GenerationError> {
        let body = GenerateRequest {
            contents: user_content(prompt),
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            }),
        };
        let parts = self.http.generate(IMAGE_PROVIDER, &self.model, &body).await?;
        let (bytes, media_type) = inline_image(parts)?;

        let asset = self
            .store
            .store(bytes, role.file_stem(), role, &media_type)
            .await?;
        tracing::debug!(reference = %asset.reference, %role, "Stored generated image");
        Ok(asset)
    }
}
