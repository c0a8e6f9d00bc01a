//! Scripted generators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::blob::{BlobStore, InMemoryBlobStore};
use crate::core::{Asset, AssetRole};
use crate::errors::GenerationError;
use crate::providers::{placeholder_png, silent_wav, ImageGenerator, MusicGenerator, TextGenerator};

const PROVIDER: &str = "scripted";

/// Default text reply when no rule matches.
pub const DEFAULT_REPLY: &str = "Scripted reply.";

/// One scripted behaviour.
#[derive(Debug, Clone)]
pub enum Script {
    /// Succeed. Text calls return the string; asset calls store a placeholder.
    Reply(String),
    /// Succeed with empty text. Asset calls report no content.
    Empty,
    /// Fail with this error.
    Fail(GenerationError),
    /// Report a successful response without payload.
    NoContent,
    /// Sleep, then behave like the inner script.
    Delay(Duration, Box<Script>),
}

impl Script {
    /// Succeeds with `text`.
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }

    /// Succeeds with an asset (the reply text is unused).
    #[must_use]
    pub fn produce() -> Self {
        Self::Reply(String::new())
    }

    /// Fails with `error`.
    #[must_use]
    pub fn fail(error: GenerationError) -> Self {
        Self::Fail(error)
    }

    /// Sleeps for `delay` first.
    #[must_use]
    pub fn delayed(delay: Duration, then: Script) -> Self {
        Self::Delay(delay, Box::new(then))
    }

    async fn settle(&self) -> Result<Option<String>, GenerationError> {
        let mut script = self;
        while let Self::Delay(delay, inner) = script {
            tokio::time::sleep(*delay).await;
            script = inner;
        }
        match script {
            Self::Reply(text) => Ok(Some(text.clone())),
            Self::Empty => Ok(None),
            Self::Fail(err) => Err(err.clone()),
            Self::NoContent => Err(GenerationError::no_content(PROVIDER, "scripted empty payload")),
            Self::Delay(..) => Ok(None),
        }
    }
}

/// Implements all three generator traits from a script.
///
/// Text prompts are matched against substring rules, newest rule first,
/// so a later `on_text` overrides an earlier one for the same pattern.
/// Every call is counted and its prompt recorded.
pub struct ScriptedGenerator {
    text_rules: Vec<(String, Script)>,
    default_text: Script,
    image_scripts: HashMap<AssetRole, Script>,
    music_script: Script,
    store: Arc<dyn BlobStore>,
    text_prompts: Mutex<Vec<String>>,
    image_prompts: Mutex<Vec<(AssetRole, String)>>,
    music_prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    /// Creates a generator that succeeds at everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            text_rules: Vec::new(),
            default_text: Script::reply(DEFAULT_REPLY),
            image_scripts: HashMap::new(),
            music_script: Script::produce(),
            store: Arc::new(InMemoryBlobStore::new()),
            text_prompts: Mutex::new(Vec::new()),
            image_prompts: Mutex::new(Vec::new()),
            music_prompts: Mutex::new(Vec::new()),
        }
    }

    /// Scripts text prompts containing `pattern`.
    #[must_use]
    pub fn on_text(mut self, pattern: impl Into<String>, script: Script) -> Self {
        self.text_rules.push((pattern.into(), script));
        self
    }

    /// Scripts text prompts no rule matches.
    #[must_use]
    pub fn on_any_text(mut self, script: Script) -> Self {
        self.default_text = script;
        self
    }

    /// Scripts image calls for `role`.
    #[must_use]
    pub fn on_image(mut self, role: AssetRole, script: Script) -> Self {
        self.image_scripts.insert(role, script);
        self
    }

    /// Scripts music calls.
    #[must_use]
    pub fn on_music(mut self, script: Script) -> Self {
        self.music_script = script;
        self
    }

    /// Stores assets in `store` instead of a private in-memory store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = store;
        self
    }

    /// The store receiving generated assets.
    #[must_use]
    pub fn store(&self) -> Arc<dyn BlobStore> {
        self.store.clone()
    }

    /// Number of text calls.
    #[must_use]
    pub fn text_calls(&self) -> usize {
        self.text_prompts.lock().len()
    }

    /// Number of image calls.
    #[must_use]
    pub fn image_calls(&self) -> usize {
        self.image_prompts.lock().len()
    }

    /// Number of music calls.
    #[must_use]
    pub fn music_calls(&self) -> usize {
        self.music_prompts.lock().len()
    }

    /// Total calls across all capabilities.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.text_calls() + self.image_calls() + self.music_calls()
    }

    /// Recorded text prompts.
    #[must_use]
    pub fn text_prompts(&self) -> Vec<String> {
        self.text_prompts.lock().clone()
    }

    /// Recorded image prompts.
    #[must_use]
    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().iter().map(|(_, p)| p.clone()).collect()
    }

    /// Recorded music prompts.
    #[must_use]
    pub fn music_prompts(&self) -> Vec<String> {
        self.music_prompts.lock().clone()
    }

    fn text_script(&self, prompt: &str) -> &Script {
        self.text_rules
            .iter()
            .rev()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map_or(&self.default_text, |(_, script)| script)
    }

    async fn produce_asset(
        &self,
        script: &Script,
        role: AssetRole,
    ) -> Result<Asset, GenerationError> {
        if script.settle().await?.is_none() {
            return Err(GenerationError::no_content(PROVIDER, "scripted empty payload"));
        }
        let (bytes, media_type) = if role.is_image() {
            (placeholder_png(role)?, "image/png")
        } else {
            (silent_wav()?, "audio/wav")
        };
        Ok(self.store.store(bytes, role.file_stem(), role, media_type).await?)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.text_prompts.lock().push(prompt.to_string());
        let reply = self.text_script(prompt).settle().await?;
        Ok(reply.unwrap_or_default())
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str, role: AssetRole) -> Result<Asset, GenerationError> {
        self.image_prompts.lock().push((role, prompt.to_string()));
        let default = Script::produce();
        let script = self.image_scripts.get(&role).unwrap_or(&default);
        self.produce_asset(script, role).await
    }
}

#[async_trait]
impl MusicGenerator for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str, _duration: Duration) -> Result<Asset, GenerationError> {
        self.music_prompts.lock().push(prompt.to_string());
        self.produce_asset(&self.music_script, AssetRole::Music).await
    }
}
