//! Persisted root directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct StoredRoot {
    root: PathBuf,
}

/// Single-value store remembering the chosen root across sessions.
///
/// Only the location is remembered. Access is re-checked every time the
/// root is opened again.
#[derive(Debug, Clone)]
pub struct RootStore {
    path: PathBuf,
}

impl RootStore {
    /// Store backed by a specific file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the user's config directory.
    pub fn user() -> Option<Self> {
        Self::default_location().map(Self::at)
    }

    /// Get the default store file path.
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("permaupload").join("root.toml"))
    }

    /// Path of the backing file.
    pub fn location(&self) -> &Path {
        &self.path
    }

    /// Remembered root, if any.
    pub fn get(&self) -> Option<PathBuf> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| toml::from_str::<StoredRoot>(&content).ok())
            .map(|stored| stored.root)
    }

    /// Remember `root`, replacing any previous value.
    pub fn put(&self, root: &Path) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&StoredRoot {
            root: root.to_path_buf(),
        })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&self.path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store() {
        let temp = TempDir::new().unwrap();
        let store = RootStore::at(temp.path().join("root.toml"));
        assert!(store.get().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = RootStore::at(temp.path().join("nested/root.toml"));

        store.put(Path::new("/srv/site-a")).unwrap();
        store.put(Path::new("/srv/site-b")).unwrap();

        assert_eq!(store.get(), Some(PathBuf::from("/srv/site-b")));
    }
}
