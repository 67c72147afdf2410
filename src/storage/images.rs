//! Image file storage
//!
//! Accepted images are written under the data directory with a random v4
//! UUID as the file stem, so concurrent writers never pick the same name.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes image payloads into a target directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    extension: String,
}

impl ImageStore {
    /// Creates a store writing `<uuid>.<extension>` files into `dir`
    ///
    /// The directory is expected to exist already.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Directory images are written into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generates a fresh file name, unique across all writers
    pub fn next_filename(&self) -> String {
        format!("{}.{}", Uuid::new_v4(), self.extension)
    }

    /// Writes `bytes` under a fresh file name
    ///
    /// # Returns
    ///
    /// * `Ok((filename, path))` - The bytes are on disk
    /// * `Err((path, io::Error))` - The write failed; `path` is where it was attempted
    pub async fn write(&self, bytes: &[u8]) -> Result<(String, PathBuf), (PathBuf, std::io::Error)> {
        let filename = self.next_filename();
        let path = self.dir.join(&filename);

        match tokio::fs::write(&path, bytes).await {
            Ok(()) => Ok((filename, path)),
            Err(e) => Err((path, e)),
        }
    }
}
