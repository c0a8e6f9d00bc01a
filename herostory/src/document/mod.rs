//! Story document assembly.
//!
//! [`assemble_document`] turns a [`DocumentPayload`] into a paginated A4
//! PDF. Referenced images are fetched from a [`BlobStore`] first; decoding,
//! layout and serialization then run on the blocking pool under a deadline.
//! Missing or unusable images and audio never fail the document, their
//! sections are simply left out.

mod compositing;
mod layout;
mod payload;
mod pdf;

pub use compositing::{clamp_opacity, prepare_background, prepare_inline, PreparedImage};
pub use layout::{text_width, wrap, Block, Face, Layouter, PageLayout, MARGIN, PAGE_HEIGHT, PAGE_WIDTH};
pub use payload::{DocumentImage, DocumentPayload, ImagePlacement, DEFAULT_TITLE};
pub use pdf::win_ansi;

use pdf::PdfSources;

use crate::blob::BlobStore;
use crate::config::HeroStoryConfig;
use crate::errors::DocumentError;
use crate::executor::{self, ExecutionFailure};
use std::time::Duration;

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentOptions {
    /// Alpha multiplier for the page background, clamped when applied.
    pub background_opacity: f32,
    /// Body font size in points.
    pub font_size: f32,
    /// Upper bound on decoding, layout and serialization.
    pub render_deadline: Duration,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            background_opacity: 0.10,
            font_size: 11.0,
            render_deadline: Duration::from_secs(60),
        }
    }
}

impl DocumentOptions {
    /// Reads the options from configuration.
    #[must_use]
    pub fn from_config(config: &HeroStoryConfig) -> Self {
        Self {
            background_opacity: config.document.background_opacity,
            font_size: config.document.font_size,
            render_deadline: config.deadlines.render(),
        }
    }
}

async fn fetch_image(store: &dyn BlobStore, image: Option<&DocumentImage>) -> Option<Vec<u8>> {
    let image = image?;
    match store.fetch(&image.reference).await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::warn!(reference = %image.reference, error = %err, "Skipping unfetchable image");
            None
        }
    }
}

/// Renders `payload` as PDF bytes.
pub async fn assemble_document(
    payload: &DocumentPayload,
    store: &dyn BlobStore,
    options: &DocumentOptions,
) -> Result<Vec<u8>, DocumentError> {
    payload.validate()?;

    let placement = payload.placement();
    let background = fetch_image(store, placement.background).await;
    let inline = fetch_image(store, placement.inline).await;

    let payload = payload.clone();
    let options = *options;
    let bytes = executor::run_blocking(
        move || render(&payload, background.as_deref(), inline.as_deref(), &options),
        options.render_deadline,
    )
    .await
    .map_err(|failure| match failure {
        ExecutionFailure::Work(err) => err,
        ExecutionFailure::Timeout { deadline } => {
            DocumentError::Render(format!("deadline of {}ms exceeded", deadline.as_millis()))
        }
        ExecutionFailure::Panicked(message) => DocumentError::Render(message),
    })?;

    tracing::info!(bytes = bytes.len(), "Document assembled");
    Ok(bytes)
}

/// Synchronous rendering from already fetched image bytes.
pub fn render(
    payload: &DocumentPayload,
    background: Option<&[u8]>,
    inline: Option<&[u8]>,
    options: &DocumentOptions,
) -> Result<Vec<u8>, DocumentError> {
    let background = background.and_then(|bytes| {
        prepare_background(bytes, options.background_opacity)
            .map_err(|err| tracing::warn!(error = %err, "Skipping unusable background image"))
            .ok()
    });
    let inline = inline.and_then(|bytes| {
        prepare_inline(bytes)
            .map_err(|err| tracing::warn!(error = %err, "Skipping unusable inline image"))
            .ok()
    });

    let mut layout = Layouter::new(options.font_size);
    layout.title(payload.title());
    for (heading, text) in [
        ("Character", payload.character.as_str()),
        ("World", payload.world.as_str()),
        ("Story", payload.story.as_str()),
    ] {
        if !text.trim().is_empty() {
            layout.heading(heading);
            layout.prose(text);
        }
    }

    if let Some(image) = &inline {
        layout.heading("Hero Scene");
        layout.image(image.width, image.height);
    }

    if let Some(analogy) = payload.analogy.as_deref().filter(|a| !a.trim().is_empty()) {
        layout.page_break();
        layout.heading("Real-Life Analogy");
        layout.prose(analogy);
    }

    if let Some(audio) = payload.audio.as_deref().filter(|a| !a.trim().is_empty()) {
        layout.heading("Soundtrack");
        layout.paragraph(audio);
    }

    let pages = layout.finish();
    tracing::debug!(pages = pages.len(), "Document laid out");
    pdf::write(
        &pages,
        &PdfSources {
            title: payload.title().to_string(),
            background,
            inline,
        },
    )
}
