//! In-memory blob store.

use super::{unique_file_name, BlobStore};
use crate::core::{Asset, AssetRole};
use crate::errors::BlobError;
use async_trait::async_trait;
use dashmap::DashMap;

const SCHEME: &str = "mem://";

/// Keeps blobs in a concurrent map. References look like `mem://music_1a2b3c4d.mp3`.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, Vec<u8>>,
}

impl InMemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Stores bytes under an exact reference, replacing any previous value.
    pub fn insert(&self, reference: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.insert(reference.into(), bytes);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(
        &self,
        bytes: Vec<u8>,
        suggested_name: &str,
        role: AssetRole,
        media_type: &str,
    ) -> Result<Asset, BlobError> {
        let reference = format!("{SCHEME}{}", unique_file_name(suggested_name, media_type));
        let asset = Asset::describe(role, reference.clone(), media_type, &bytes);
        self.blobs.insert(reference, bytes);
        Ok(asset)
    }

    async fn fetch(&self, reference: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .get(reference)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::not_found(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_fetch() {
        let store = InMemoryBlobStore::new();
        let asset = store
            .store(vec![9; 16], "background", AssetRole::BackgroundImage, "image/png")
            .await
            .unwrap();

        assert!(asset.reference.starts_with("mem://background_"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.fetch(&asset.reference).await.unwrap(), vec![9; 16]);
    }

    #[tokio::test]
    async fn test_insert_uses_exact_reference_and_replaces() {
        let store = InMemoryBlobStore::new();
        store.insert("uploads/hero.png", vec![1, 2, 3]);
        store.insert("uploads/hero.png", vec![4]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.fetch("uploads/hero.png").await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_fetch_missing() {
        let store = InMemoryBlobStore::new();
        assert!(store.is_empty());
        let err = store.fetch("mem://missing.png").await.unwrap_err();
        assert!(matches!(err, BlobError::NotFound { .. }));
    }
}
