//! Directory-backed blob store.

use super::{is_safe_file_name, unique_file_name, BlobStore};
use crate::core::{Asset, AssetRole};
use crate::errors::BlobError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Stores each blob as a uniquely named file in one directory.
///
/// References have the form `{url_prefix}/{file_name}` so they can double as
/// public URLs when the directory is served statically.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsBlobStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            url_prefix: "/static/output".to_string(),
        })
    }

    /// Sets the prefix used when building references.
    #[must_use]
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, BlobError> {
        let name = reference
            .strip_prefix(&self.url_prefix)
            .map_or(reference, |rest| rest.trim_start_matches('/'));
        if !is_safe_file_name(name) {
            return Err(BlobError::InvalidReference {
                reference: reference.to_string(),
            });
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        role: AssetRole,
        media_type: &str,
    ) -> Result<Asset, BlobError> {
        let file_name = unique_file_name(suggested_name, media_type);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, &bytes).await?;

        let reference = format!("{}/{}", self.url_prefix, file_name);
        tracing::debug!(reference = %reference, bytes = bytes.len(), %role, "Stored blob");
        Ok(Asset::describe(role, reference, media_type, &bytes))
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::not_found(reference))
            }
            Err(err) => Err(err.into()),
        }
    }
}
