//! Handles to generated binary content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// What a stored asset is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    /// Full-page background illustration.
    BackgroundImage,
    /// Inline hero scene illustration.
    HeroImage,
    /// Instrumental soundtrack.
    Music,
}

impl AssetRole {
    /// Returns true for image roles.
    #[must_use]
    pub fn is_image(self) -> bool {
        matches!(self, Self::BackgroundImage | Self::HeroImage)
    }

    /// Filename stem used when storing assets of this role.
    #[must_use]
    pub fn file_stem(self) -> &'static str {
        match self {
            Self::BackgroundImage => "background",
            Self::HeroImage => "hero_image",
            Self::Music => "music",
        }
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackgroundImage => write!(f, "background_image"),
            Self::HeroImage => write!(f, "hero_image"),
            Self::Music => write!(f, "music"),
        }
    }
}

/// An immutable handle to a stored image or audio blob.
///
/// The bytes live in the blob store; the asset only carries the reference
/// needed to fetch them again plus enough metadata to describe them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// What the asset is for.
    pub role: AssetRole,
    /// Stable reference resolvable by the blob store (path or URL).
    pub reference: String,
    /// MIME type of the stored bytes.
    pub media_type: String,
    /// Size of the stored bytes.
    pub byte_len: usize,
    /// Hex SHA-256 of the stored bytes.
    pub digest: String,
    /// When the asset was stored.
    pub created_at: DateTime<Utc>,
}

impl Asset {
    /// Creates an asset describing `bytes` stored under `reference`.
    #[must_use]
    pub fn describe(
        role: AssetRole,
        reference: impl Into<String>,
        media_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        Self {
            role,
            reference: reference.into(),
            media_type: media_type.into(),
            byte_len: bytes.len(),
            digest: content_digest(bytes),
            created_at: Utc::now(),
        }
    }

    /// Returns true if the asset is an image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.role.is_image()
    }
}

/// Hex SHA-256 digest of `bytes`.
#[must_use]
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// File extension for a MIME type, defaulting to `bin`.
#[must_use]
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}
