//! The content a document is rendered from.

use crate::core::{AssetRole, PipelineResult};
use crate::errors::DocumentError;
use serde::{Deserialize, Serialize};

/// Title used when the payload names no hero.
pub const DEFAULT_TITLE: &str = "The Hero";

/// An image reference as supplied by a client or a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentImage {
    /// Blob store reference.
    pub reference: String,
    /// Role, when known.
    #[serde(default)]
    pub role: Option<AssetRole>,
}

/// Everything needed to render a story document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Hero name used as the title.
    #[serde(default)]
    pub hero_name: Option<String>,
    /// Character description.
    #[serde(default)]
    pub character: String,
    /// World description.
    #[serde(default)]
    pub world: String,
    /// Story text.
    #[serde(default)]
    pub story: String,
    /// Images, background first.
    #[serde(default)]
    pub images: Vec<DocumentImage>,
    /// Soundtrack reference.
    #[serde(default)]
    pub audio: Option<String>,
    /// Real-life analogy text.
    #[serde(default)]
    pub analogy: Option<String>,
}

/// Which images go where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImagePlacement<'a> {
    /// Composited behind every page.
    pub background: Option<&'a DocumentImage>,
    /// Rendered in the hero section.
    pub inline: Option<&'a DocumentImage>,
}

impl From<&PipelineResult> for DocumentPayload {
    fn from(result: &PipelineResult) -> Self {
        Self {
            hero_name: result.hero_name.clone(),
            character: result.request.character.clone(),
            world: result.request.world.clone(),
            story: result.story.clone().unwrap_or_default(),
            images: result
                .images
                .iter()
                .map(|asset| DocumentImage {
                    reference: asset.reference.clone(),
                    role: Some(asset.role),
                })
                .collect(),
            audio: result.audio.as_ref().map(|a| a.reference.clone()),
            analogy: result.analogy.clone(),
        }
    }
}

impl DocumentPayload {
    /// Parses a client payload, or a serialized [`PipelineResult`].
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        if let Ok(result) = serde_json::from_str::<PipelineResult>(json) {
            return Ok(Self::from(&result));
        }
        serde_json::from_str(json).map_err(|e| DocumentError::InvalidPayload(e.to_string()))
    }

    /// The document title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.hero_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Rejects payloads with nothing to render.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.story.trim().is_empty() {
            return Err(DocumentError::InvalidPayload("story is empty".to_string()));
        }
        Ok(())
    }

    /// Decides image placement.
    ///
    /// With two or more images the background-role image (else the second)
    /// becomes the page background and the hero-role image (else the
    /// first) goes inline. A single image always goes inline.
    #[must_use]
    pub fn placement(&self) -> ImagePlacement<'_> {
        match self.images.as_slice() {
            [] => ImagePlacement::default(),
            [only] => ImagePlacement {
                background: None,
                inline: Some(only),
            },
            [first, second, ..] => {
                let with_role = |role| self.images.iter().find(|i| i.role == Some(role));
                let background = with_role(AssetRole::BackgroundImage).unwrap_or(second);
                let inline = with_role(AssetRole::HeroImage)
                    .filter(|i| !std::ptr::eq(*i, background))
                    .unwrap_or(if std::ptr::eq(first, background) { second } else { first });
                ImagePlacement {
                    background: Some(background),
                    inline: Some(inline),
                }
            }
        }
    }
}
