//! Image preparation for embedding: decoding, downscaling and alpha
//! attenuation of the background.

use crate::config::{MIN_BACKGROUND_OPACITY, MAX_BACKGROUND_OPACITY};
use crate::errors::DocumentError;
use image::DynamicImage;

const DEFAULT_OPACITY: f32 = 0.10;
const MAX_DIMENSION: u32 = 1600;

/// An image split into the planes a PDF image XObject needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Packed 8-bit RGB samples.
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples, present when any pixel is not opaque.
    pub alpha: Option<Vec<u8>>,
}

/// Clamps an opacity into the supported range. NaN maps to the default.
#[must_use]
pub fn clamp_opacity(opacity: f32) -> f32 {
    if opacity.is_nan() {
        return DEFAULT_OPACITY;
    }
    opacity.clamp(MIN_BACKGROUND_OPACITY, MAX_BACKGROUND_OPACITY)
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, DocumentError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| DocumentError::InvalidPayload(format!("undecodable image: {e}")))?;
    if image.width() > MAX_DIMENSION || image.height() > MAX_DIMENSION {
        return Ok(image.thumbnail(MAX_DIMENSION, MAX_DIMENSION));
    }
    Ok(image)
}

fn split(image: &DynamicImage, alpha_scale: Option<f32>) -> PreparedImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = (width as usize) * (height as usize);

    let mut rgb = Vec::with_capacity(pixels * 3);
    let mut alpha = Vec::with_capacity(pixels);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(match alpha_scale {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(scale) => (f32::from(a) * scale).round().clamp(0.0, 255.0) as u8,
            None => a,
        });
    }

    let alpha = if alpha.iter().all(|a| *a == u8::MAX) {
        None
    } else {
        Some(alpha)
    };
    PreparedImage {
        width,
        height,
        rgb,
        alpha,
    }
}

/// Decodes an image for inline placement, keeping its own transparency.
pub fn prepare_inline(bytes: &[u8]) -> Result<PreparedImage, DocumentError> {
    Ok(split(&decode(bytes)?, None))
}

/// Decodes the background and multiplies only its alpha channel by the
/// clamped `opacity`. Colour samples are left untouched.
pub fn prepare_background(bytes: &[u8], opacity: f32) -> Result<PreparedImage, DocumentError> {
    let opacity = clamp_opacity(opacity);
    Ok(split(&decode(bytes)?, Some(opacity)))
}
