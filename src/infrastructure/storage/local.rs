use std::path::PathBuf;

use tokio::fs;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory of generated assets, shared by every worker and served statically by the API.
#[derive(Clone, Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File names are flat; anything that could escape the root is rejected.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let is_flat = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);

        if !is_flat {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }

        Ok(self.root.join(file_name))
    }

    /// Writes (or overwrites) `file_name`. Concurrent writers of the same name race; last one wins.
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(file_name)?;

        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Stored asset");
        Ok(path)
    }

    pub async fn exists(&self, file_name: &str) -> bool {
        match self.path_for(file_name) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
