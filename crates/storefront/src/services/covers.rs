//! Cover image storage.
//!
//! Covers live on the local filesystem as `{root}/{key}.jpg`, where the key is
//! the sanitized game name from [`pixel_vault_core::cover_key`]. The directory
//! is served by `ServeDir` under `/covers`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extension every stored cover carries.
pub const COVER_EXTENSION: &str = "jpg";

/// JPEG start-of-image marker.
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Errors raised while accepting or storing a cover image.
#[derive(Debug, Error)]
pub enum CoverError {
    /// No file was uploaded.
    #[error("a cover image is required")]
    Missing,

    /// The upload is not a `.jpg` JPEG image.
    #[error("cover image must be a .jpg file")]
    NotJpeg,

    /// The upload exceeds the configured size limit.
    #[error("cover image must be at most {max} bytes")]
    TooLarge { max: usize },

    /// The key sanitized to nothing or is not a plain file stem.
    #[error("invalid cover key: {0:?}")]
    InvalidKey(String),

    /// Filesystem failure.
    #[error("cover storage error: {0}")]
    Io(#[from] io::Error),
}

/// Filesystem-backed store for cover images.
#[derive(Debug, Clone)]
pub struct CoverStore {
    root: PathBuf,
    max_bytes: usize,
}

impl CoverStore {
    /// Create a store rooted at `root`, accepting uploads up to `max_bytes`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    /// Directory the covers are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check an uploaded file before anything is written or inserted.
    ///
    /// # Errors
    ///
    /// Returns `CoverError::Missing` for an empty upload, `CoverError::NotJpeg`
    /// when the file name or contents are not JPEG, `CoverError::TooLarge`
    /// past the size limit.
    pub fn validate_upload(&self, file_name: &str, bytes: &[u8]) -> Result<(), CoverError> {
        if file_name.trim().is_empty() || bytes.is_empty() {
            return Err(CoverError::Missing);
        }
        let is_jpg = Path::new(file_name.trim())
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(COVER_EXTENSION));
        if !is_jpg || !bytes.starts_with(&JPEG_MAGIC) {
            return Err(CoverError::NotJpeg);
        }
        if bytes.len() > self.max_bytes {
            return Err(CoverError::TooLarge {
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Path of the cover stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CoverError::InvalidKey` unless `key` is a non-empty plain
    /// file stem.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CoverError> {
        let plain = !key.is_empty()
            && key == key.trim()
            && !key.contains(['/', '\\', '.'])
            && !key.chars().any(char::is_control);
        if !plain {
            return Err(CoverError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.{COVER_EXTENSION}")))
    }

    /// Write a cover, replacing any existing one with the same key.
    ///
    /// The bytes go to a temporary file that is renamed into place, so
    /// readers never see a partial image.
    ///
    /// # Errors
    ///
    /// Returns `CoverError::InvalidKey` for a bad key and `CoverError::Io` if
    /// the write fails.
    pub async fn save(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, CoverError> {
        self.stage(key, bytes).await?.commit().await
    }

    /// Write a cover to a temporary file without publishing it.
    ///
    /// Nothing under `key` changes until [`StagedCover::commit`]; a staged
    /// cover that is discarded leaves any existing cover untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoverError::InvalidKey` for a bad key and `CoverError::Io` if
    /// the write fails.
    pub async fn stage(&self, key: &str, bytes: &[u8]) -> Result<StagedCover, CoverError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let tmp = self
            .root
            .join(format!(".{}.upload", uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        Ok(StagedCover {
            tmp,
            path,
            size: bytes.len(),
        })
    }

    /// Whether a cover is stored under `key`.
    pub async fn exists(&self, key: &str) -> bool {
        match self.path_for(key) {
            Ok(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// A cover written to a temporary file, waiting to be published.
#[derive(Debug)]
#[must_use = "a staged cover must be committed or discarded"]
pub struct StagedCover {
    tmp: PathBuf,
    path: PathBuf,
    size: usize,
}

impl StagedCover {
    /// Final location once committed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the temporary file into place, replacing any existing cover.
    ///
    /// # Errors
    ///
    /// Returns `CoverError::Io` if the rename fails; the temporary file is
    /// removed in that case.
    pub async fn commit(self) -> Result<PathBuf, CoverError> {
        if let Err(e) = tokio::fs::rename(&self.tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&self.tmp).await;
            return Err(e.into());
        }
        tracing::debug!(path = %self.path.display(), size = self.size, "Cover saved");
        Ok(self.path)
    }

    /// Drop the temporary file.
    pub async fn discard(self) {
        if let Err(e) = tokio::fs::remove_file(&self.tmp).await {
            tracing::warn!(path = %self.tmp.display(), error = %e, "Failed to remove staged cover");
        }
    }
}
