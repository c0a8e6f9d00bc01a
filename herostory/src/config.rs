//! Configuration for the herostory pipeline.
//!
//! Every field has a default so an empty TOML document is a valid config.
//! Secrets are usually supplied through the environment and merged with
//! [`HeroStoryConfig::apply_env`].

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lowest accepted background opacity.
pub const MIN_BACKGROUND_OPACITY: f32 = 0.05;
/// Highest accepted background opacity.
pub const MAX_BACKGROUND_OPACITY: f32 = 0.15;
/// Smallest accepted body font size, in points.
pub const MIN_FONT_SIZE: f32 = 6.0;
/// Largest accepted body font size, in points.
pub const MAX_FONT_SIZE: f32 = 24.0;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeroStoryConfig {
    /// External generative services.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Per-stage deadlines.
    #[serde(default)]
    pub deadlines: StageDeadlines,
    /// Soundtrack parameters.
    #[serde(default)]
    pub music: MusicConfig,
    /// How optional branches are scheduled.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Document rendering.
    #[serde(default)]
    pub document: DocumentConfig,
    /// Asset storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HeroStoryConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file and overlays environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = toml::from_str(&source)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlays values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Overlays values from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.providers.gemini.api_key = Some(key);
        }
        if let Some(model) = lookup("GEMINI_TEXT_MODEL") {
            self.providers.gemini.text_model = model;
        }
        if let Some(model) = lookup("GEMINI_IMAGE_MODEL") {
            self.providers.gemini.image_model = model;
        }
        if let Some(key) = lookup("ELEVENLABS_API_KEY") {
            self.providers.elevenlabs.api_key = Some(key);
        }
        if let Some(dir) = lookup("HEROSTORY_OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.deadlines.validate()?;

        if self.music.length_secs == 0 {
            return Err(ConfigError::Invalid("music.length_secs must be positive".into()));
        }

        let opacity = self.document.background_opacity;
        if !(MIN_BACKGROUND_OPACITY..=MAX_BACKGROUND_OPACITY).contains(&opacity) {
            return Err(ConfigError::Invalid(format!(
                "document.background_opacity must be within {MIN_BACKGROUND_OPACITY}..={MAX_BACKGROUND_OPACITY}, got {opacity}"
            )));
        }

        let font_size = self.document.font_size;
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
            return Err(ConfigError::Invalid(format!(
                "document.font_size must be within {MIN_FONT_SIZE}..={MAX_FONT_SIZE}, got {font_size}"
            )));
        }

        if self.providers.gemini.timeout_secs == 0 || self.providers.elevenlabs.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider timeout_secs must be positive".into()));
        }

        Ok(())
    }
}

/// External service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Text and image model service.
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Music model service.
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,
}

/// Gemini settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Without one the placeholder generator is used.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model used for prose.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Model used for illustrations.
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Base endpoint URL.
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    /// HTTP timeout in seconds. Stage deadlines are enforced separately.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_http_timeout() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            endpoint: default_gemini_endpoint(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// ElevenLabs settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    /// API key. Without one the placeholder generator is used.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base endpoint URL.
    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_elevenlabs_endpoint(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl std::fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Deadlines for each stage, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDeadlines {
    /// Story generation.
    #[serde(default = "default_story_secs")]
    pub story_secs: u64,
    /// Hero name extraction.
    #[serde(default = "default_name_secs")]
    pub hero_name_secs: u64,
    /// Prompt phase of each two-phase stage.
    #[serde(default = "default_prompt_secs")]
    pub prompt_secs: u64,
    /// Background image, both phases.
    #[serde(default = "default_image_secs")]
    pub background_image_secs: u64,
    /// Hero image, both phases.
    #[serde(default = "default_image_secs")]
    pub hero_image_secs: u64,
    /// Music, both phases.
    #[serde(default = "default_music_secs")]
    pub music_secs: u64,
    /// Analogy generation.
    #[serde(default = "default_analogy_secs")]
    pub analogy_secs: u64,
    /// Document rendering.
    #[serde(default = "default_render_secs")]
    pub render_secs: u64,
}

fn default_story_secs() -> u64 {
    60
}

fn default_name_secs() -> u64 {
    30
}

fn default_prompt_secs() -> u64 {
    30
}

fn default_image_secs() -> u64 {
    80
}

fn default_music_secs() -> u64 {
    90
}

fn default_analogy_secs() -> u64 {
    45
}

fn default_render_secs() -> u64 {
    60
}

impl Default for StageDeadlines {
    fn default() -> Self {
        Self {
            story_secs: default_story_secs(),
            hero_name_secs: default_name_secs(),
            prompt_secs: default_prompt_secs(),
            background_image_secs: default_image_secs(),
            hero_image_secs: default_image_secs(),
            music_secs: default_music_secs(),
            analogy_secs: default_analogy_secs(),
            render_secs: default_render_secs(),
        }
    }
}

impl StageDeadlines {
    /// Story deadline.
    #[must_use]
    pub fn story(&self) -> Duration {
        Duration::from_secs(self.story_secs)
    }

    /// Hero name deadline.
    #[must_use]
    pub fn hero_name(&self) -> Duration {
        Duration::from_secs(self.hero_name_secs)
    }

    /// Prompt phase deadline.
    #[must_use]
    pub fn prompt(&self) -> Duration {
        Duration::from_secs(self.prompt_secs)
    }

    /// Background image deadline.
    #[must_use]
    pub fn background_image(&self) -> Duration {
        Duration::from_secs(self.background_image_secs)
    }

    /// Hero image deadline.
    #[must_use]
    pub fn hero_image(&self) -> Duration {
        Duration::from_secs(self.hero_image_secs)
    }

    /// Music deadline.
    #[must_use]
    pub fn music(&self) -> Duration {
        Duration::from_secs(self.music_secs)
    }

    /// Analogy deadline.
    #[must_use]
    pub fn analogy(&self) -> Duration {
        Duration::from_secs(self.analogy_secs)
    }

    /// Render deadline.
    #[must_use]
    pub fn render(&self) -> Duration {
        Duration::from_secs(self.render_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            ("story_secs", self.story_secs),
            ("hero_name_secs", self.hero_name_secs),
            ("prompt_secs", self.prompt_secs),
            ("background_image_secs", self.background_image_secs),
            ("hero_image_secs", self.hero_image_secs),
            ("music_secs", self.music_secs),
            ("analogy_secs", self.analogy_secs),
            ("render_secs", self.render_secs),
        ];
        if let Some((name, _)) = all.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("deadlines.{name} must be positive")));
        }
        Ok(())
    }
}

/// Soundtrack parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    /// Clip length in seconds.
    #[serde(default = "default_music_length")]
    pub length_secs: u64,
    /// Provider output format.
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_music_length() -> u64 {
    30
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            length_secs: default_music_length(),
            output_format: default_output_format(),
        }
    }
}

impl MusicConfig {
    /// Clip length as a duration.
    #[must_use]
    pub fn length(&self) -> Duration {
        Duration::from_secs(self.length_secs)
    }
}

/// Scheduling of the optional branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// All optional branches in flight at once.
    #[default]
    Concurrent,
    /// One branch after another, in declared order.
    Sequential,
}

/// Execution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Branch scheduling.
    #[serde(default)]
    pub mode: ExecutionMode,
}

/// Document rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Alpha multiplier for the full-page background.
    #[serde(default = "default_opacity")]
    pub background_opacity: f32,
    /// Body font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_opacity() -> f32 {
    0.10
}

fn default_font_size() -> f32 {
    11.0
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            background_opacity: default_opacity(),
            font_size: default_font_size(),
        }
    }
}

/// Asset storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving generated assets.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Prefix of asset references.
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/output")
}

fn default_url_prefix() -> String {
    "/static/output".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            url_prefix: default_url_prefix(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
