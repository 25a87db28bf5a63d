//! Directory and file capabilities.
//!
//! A capability is an opaque, revocable reference to something the user has
//! granted access to. The rest of the crate only ever talks to these traits,
//! so the same navigation and collection code runs against the local
//! filesystem, an in-memory tree or any other backend.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::FileSnapshot;
use crate::error::FsError;

/// Shared reference to a directory capability.
pub type DirRef = Arc<dyn DirectoryHandle>;

/// Shared reference to a file capability.
pub type FileRef = Arc<dyn FileHandle>;

/// A child yielded by [`DirectoryHandle::entries`].
#[derive(Debug, Clone)]
pub enum Handle {
    Directory(DirRef),
    File(FileRef),
}

impl Handle {
    /// Bare name of the child.
    pub fn name(&self) -> &str {
        match self {
            Handle::Directory(dir) => dir.name(),
            Handle::File(file) => file.name(),
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Handle::Directory(_))
    }
}

/// A directory the holder may enumerate, open children of and write into.
#[async_trait]
pub trait DirectoryHandle: Send + Sync + Debug {
    /// Bare name of the directory.
    fn name(&self) -> &str;

    /// Enumerate the immediate children. Order is backend defined.
    async fn entries(&self) -> Result<Vec<Handle>, FsError>;

    /// Open a child directory by name.
    async fn get_directory(&self, name: &str) -> Result<DirRef, FsError> {
        match self.entries().await?.into_iter().find(|h| h.name() == name) {
            Some(Handle::Directory(dir)) => Ok(dir),
            Some(Handle::File(_)) => Err(FsError::NotADirectory { path: name.into() }),
            None => Err(FsError::NotFound { path: name.into() }),
        }
    }

    /// Open a child file by name, creating an empty one when `create` is set.
    async fn get_file(&self, name: &str, create: bool) -> Result<FileRef, FsError>;
}

/// A file the holder may inspect, read and overwrite.
#[async_trait]
pub trait FileHandle: Send + Sync + Debug {
    /// Bare name of the file.
    fn name(&self) -> &str;

    /// Fetch metadata without reading content.
    async fn snapshot(&self) -> Result<FileSnapshot, FsError>;

    /// Read the full content.
    async fn read(&self) -> Result<Vec<u8>, FsError>;

    /// Replace the full content.
    async fn write(&self, contents: &[u8]) -> Result<(), FsError>;
}
