//! Media object store.
//!
//! Archived message content lands under a local base path at
//! `YYYY-MM-DD/<timestamp>-<messageId>-<kind><ext>` and is referenced from
//! message records by its public URL, `<public base>/<bucket>/<path>`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal via hostile object path segments.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ServerError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(&canonical_base)
        .unwrap_or(target)
        .components()
    {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
            _ => {} // RootDir, CurDir, Prefix — skip
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ServerError::BadRequest(
            "Path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl MediaStore {
    pub async fn new(
        base_path: PathBuf,
        bucket: String,
        public_base_url: String,
    ) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::MediaStorage(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), bucket = %bucket, "Media store initialized");

        Ok(Self {
            base_path,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Object path for one archived message body:
    /// `YYYY-MM-DD/<timestamp>-<messageId>-<kind><ext>` (UTC date).
    pub fn object_path(timestamp_ms: i64, message_id: &str, kind: &str, ext: &str) -> String {
        let date = Utc::now().format("%Y-%m-%d");
        format!("{date}/{timestamp_ms}-{message_id}-{kind}{ext}")
    }

    /// Upload a local file to `object_path` and return its public URL.
    pub async fn store(&self, object_path: &str, local_path: &Path) -> Result<String, ServerError> {
        let target = self.safe_object_path(object_path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ServerError::MediaStorage(format!("Failed to create object directory: {e}"))
            })?;
        }

        fs::copy(local_path, &target).await.map_err(|e| {
            ServerError::MediaStorage(format!("Failed to store object {object_path}: {e}"))
        })?;

        debug!(path = %object_path, "stored media object");
        Ok(self.public_url(object_path))
    }

    /// Public HTTPS URL of an object.
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, object_path)
    }

    /// Safe on-disk path for an object, validated against traversal.
    fn safe_object_path(&self, object_path: &str) -> Result<PathBuf, ServerError> {
        let raw = self.base_path.join(object_path);
        ensure_within(&self.base_path, &raw)
    }
}
