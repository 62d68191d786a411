//! Attachment files on local disk, addressed by paths relative to a root.

use std::path::{Component, Path, PathBuf};

use crate::error::{RamError, RamResult};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a relative path under the root. Absolute paths and `..` are refused.
    pub fn resolve(&self, relative: &str) -> RamResult<PathBuf> {
        let path = Path::new(relative);
        let clean = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !clean {
            return Err(RamError::InvalidRequest(format!(
                "path '{}' is outside the attachments root",
                relative
            )));
        }
        Ok(self.root.join(path))
    }

    pub async fn load(&self, relative: &str) -> RamResult<Vec<u8>> {
        let full = self.resolve(relative)?;
        tokio::fs::read(&full).await.map_err(|source| {
            tracing::warn!(path = %full.display(), error = %source, "file load failed");
            RamError::FileLoad {
                path: relative.to_string(),
                source,
            }
        })
    }

    pub async fn store(&self, relative: &str, bytes: &[u8]) -> RamResult<()> {
        let full = self.resolve(relative)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RamError::Internal(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| RamError::Internal(format!("cannot write {}: {}", full.display(), e)))?;
        tracing::debug!(path = %full.display(), size = bytes.len(), "file stored");
        Ok(())
    }

    /// Move a stored file to another relative path, replacing the target.
    pub async fn rename(&self, from: &str, to: &str) -> RamResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        tokio::fs::rename(&source, &target).await.map_err(|e| {
            RamError::Internal(format!(
                "cannot move {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> RamResult<()> {
        let full = self.resolve(relative)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RamError::Internal(format!("cannot remove {}: {}", full.display(), e))),
        }
    }
}
