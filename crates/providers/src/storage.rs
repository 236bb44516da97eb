//! [`AssetStore`] implementations.
//!
//! [`LocalAssetStore`] writes each rendered clip to its own file under a
//! root directory; [`MemoryAssetStore`] keeps clips in a map for tests and
//! database-less development runs.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pitch_core::assets::{self, AssetError, AssetStore, StoredAsset};
use pitch_core::upstream::SynthesizedAudio;
use tokio::sync::RwLock;

fn new_reference(audio: &SynthesizedAudio) -> String {
    format!(
        "{}.{}",
        uuid::Uuid::new_v4(),
        assets::extension_for(&audio.content_type)
    )
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Stores audio files under a single directory.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    /// Open (creating if needed) the storage directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, audio: &SynthesizedAudio) -> Result<String, AssetError> {
        let reference = new_reference(audio);
        let final_path = self.root.join(&reference);
        let tmp_path = self.root.join(format!(".{reference}.tmp"));

        // Write then rename so a reader never sees a partial file.
        let written = match tokio::fs::write(&tmp_path, &audio.bytes).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &final_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            // A failed write may have left a partial temp file.
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temp audio file");
                }
            }
            return Err(e.into());
        }

        tracing::debug!(reference = %reference, bytes = audio.bytes.len(), "Stored audio asset");
        Ok(reference)
    }

    async fn load(&self, reference: &str) -> Result<StoredAsset, AssetError> {
        assets::validate_reference(reference)?;

        match tokio::fs::read(self.root.join(reference)).await {
            Ok(bytes) => Ok(StoredAsset {
                bytes,
                content_type: assets::content_type_for(reference),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AssetError::NotFound(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), AssetError> {
        assets::validate_reference(reference)?;

        match tokio::fs::remove_file(self.root.join(reference)).await {
            Ok(()) => {
                tracing::debug!(reference = %reference, "Removed audio asset");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps audio in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn store(&self, audio: &SynthesizedAudio) -> Result<String, AssetError> {
        let reference = new_reference(audio);
        self.assets
            .write()
            .await
            .insert(reference.clone(), audio.bytes.clone());
        Ok(reference)
    }

    async fn load(&self, reference: &str) -> Result<StoredAsset, AssetError> {
        assets::validate_reference(reference)?;
        let assets_map = self.assets.read().await;
        let bytes = assets_map
            .get(reference)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(reference.to_string()))?;
        Ok(StoredAsset {
            bytes,
            content_type: assets::content_type_for(reference),
        })
    }

    async fn remove(&self, reference: &str) -> Result<(), AssetError> {
        assets::validate_reference(reference)?;
        self.assets.write().await.remove(reference);
        Ok(())
    }
}
