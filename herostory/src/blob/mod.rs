//! Blob storage for generated assets.
//!
//! Generators hand their bytes to a [`BlobStore`] and get back an
//! [`Asset`] whose `reference` can later be resolved with
//! [`BlobStore::fetch`] (the document assembler does this for images).

mod fs;
mod memory;

pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;

use crate::core::{extension_for, Asset, AssetRole};
use crate::errors::BlobError;
use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

/// Content store addressed by unique file names.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under a unique name derived from `suggested_name`.
    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        role: AssetRole,
        media_type: &str,
    ) -> Result<Asset, BlobError>;

    /// Loads the bytes behind a reference previously returned by `store`.
    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, BlobError>;

    /// Stores the contents of an existing file.
    async fn store_file(
        &self,
        path: &Path,
        role: AssetRole,
        media_type: &str,
    ) -> Result<Asset, BlobError> {
        let bytes = tokio::fs::read(path).await?;
        let suggested = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_else(|| role.file_stem())
            .to_string();
        self.store(bytes, &suggested, role, media_type).await
    }
}

/// Builds a unique file name such as `hero_image_1a2b3c4d.png`.
///
/// The suggested stem is reduced to `[A-Za-z0-9_-]`; an empty result falls
/// back to `asset`.
#[must_use]
pub fn unique_file_name(suggested_name: &str, media_type: &str) -> String {
    let stem = Path::new(suggested_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let mut clean: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(48)
        .collect();
    if clean.is_empty() {
        clean.push_str("asset");
    }
    let id = Uuid::new_v4().simple().to_string();
    format!("{clean}_{}.{}", &id[..8], extension_for(media_type))
}

/// Returns true if `name` is a bare file name this module could have produced.
pub(crate) fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
