//! Local filesystem blob store

use async_trait::async_trait;
use docsift_core::{AppResult, BlobStore};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::{InfraError, Result};

const LOCATOR_SCHEME: &str = "local://";

/// Writes each upload to `<root>/<uuid>-<name>`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` and return the path written.
    pub async fn write(&self, bytes: &[u8], name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_name(name));
        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Blob written");
        Ok(path)
    }

    /// Path for a locator previously returned by this store.
    pub fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let path = locator
            .strip_prefix(LOCATOR_SCHEME)
            .map(PathBuf::from)
            .ok_or_else(|| InfraError::NotFound(format!("not a local locator: {}", locator)))?;

        if path.parent() != Some(self.root.as_path()) {
            return Err(InfraError::NotFound(format!(
                "locator {} is outside {}",
                locator,
                self.root.display()
            )));
        }
        Ok(path)
    }

    /// Read back the bytes behind a locator.
    pub async fn read(&self, locator: &str) -> Result<Vec<u8>> {
        let path = self.resolve(locator)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(InfraError::NotFound(format!("blob {}", locator)))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the blob behind a locator. A missing file is not an error.
    pub async fn delete(&self, locator: &str) -> Result<()> {
        let path = self.resolve(locator)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Blob deleted");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: &[u8], name: &str) -> AppResult<String> {
        let path = self.write(bytes, name).await?;
        Ok(format!("{}{}", LOCATOR_SCHEME, path.display()))
    }

    async fn remove(&self, locator: &str) -> AppResult<()> {
        self.delete(locator).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Keep the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`.
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
