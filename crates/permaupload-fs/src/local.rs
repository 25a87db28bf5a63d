//! Local filesystem backend built on `tokio::fs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use permaupload_core::{
    DirRef, DirectoryHandle, FileHandle, FileRef, FileSnapshot, FsError, Handle,
};

/// A directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    /// Open an existing directory as a root capability.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FsError> {
        let path = path.as_ref();
        let path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| FsError::io(path.display().to_string(), e))?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::io(path.display().to_string(), e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.display().to_string(),
            });
        }

        let name = display_name(&path);
        Ok(Self { path, name })
    }

    /// Absolute path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wrap into a shared capability.
    pub fn into_ref(self) -> DirRef {
        Arc::new(self)
    }

    fn child_path(&self, name: &str) -> Result<PathBuf, FsError> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(FsError::other(format!("Invalid entry name: {name:?}")));
        }
        Ok(self.path.join(name))
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<Handle>, FsError> {
        let mut read_dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| FsError::io(self.path.display().to_string(), e))?;

        let mut handles = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| FsError::io(self.path.display().to_string(), e))?
        {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            // Follows symlinks, so a dangling link fails here and is skipped.
            let metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if metadata.is_dir() {
                handles.push(Handle::Directory(Arc::new(LocalDirectory { path, name })));
            } else if metadata.is_file() {
                handles.push(Handle::File(Arc::new(LocalFile { path, name })));
            } else {
                debug!(path = %path.display(), "skipping special file");
            }
        }

        Ok(handles)
    }

    async fn get_directory(&self, name: &str) -> Result<DirRef, FsError> {
        let path = self.child_path(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::io(path.display().to_string(), e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.display().to_string(),
            });
        }
        Ok(Arc::new(LocalDirectory {
            path,
            name: name.to_string(),
        }))
    }

    async fn get_file(&self, name: &str, create: bool) -> Result<FileRef, FsError> {
        let path = self.child_path(name)?;
        if create {
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| FsError::io(path.display().to_string(), e))?;
        }

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| FsError::io(path.display().to_string(), e))?;
        if !metadata.is_file() {
            return Err(FsError::NotAFile {
                path: path.display().to_string(),
            });
        }
        Ok(Arc::new(LocalFile {
            path,
            name: name.to_string(),
        }))
    }
}

/// A regular file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn snapshot(&self) -> Result<FileSnapshot, FsError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| FsError::io(self.path.display().to_string(), e))?;
        Ok(FileSnapshot::new(
            self.name.as_str(),
            metadata.len(),
            metadata.modified().ok(),
        ))
    }

    async fn read(&self) -> Result<Vec<u8>, FsError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| FsError::io(self.path.display().to_string(), e))
    }

    async fn write(&self, contents: &[u8]) -> Result<(), FsError> {
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| FsError::io(self.path.display().to_string(), e))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
