//! Directory entries and file snapshots.

use std::cmp::Ordering;
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::capability::{DirRef, FileRef};
use crate::error::FsError;
use crate::mime::{CONTENT_TYPE_TAG, content_type_for};

/// Name/value metadata attached to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Metadata of a file at the moment it was listed. Holds no content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// File name, or relative path once staged for upload.
    pub name: CompactString,
    /// Size in bytes.
    pub size: u64,
    /// Detected content type (empty when unknown).
    pub content_type: String,
    /// Last modification time, if the backend reports one.
    pub last_modified: Option<SystemTime>,
    /// Upload tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl FileSnapshot {
    /// Create a snapshot, deriving the content type from the name.
    pub fn new(name: impl Into<CompactString>, size: u64, last_modified: Option<SystemTime>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            size,
            content_type,
            last_modified,
            tags: Vec::new(),
        }
    }

    /// Replace the tags with a single `Content-Type` tag.
    pub fn tagged(mut self) -> Self {
        self.tags = vec![Tag::new(CONTENT_TYPE_TAG, self.content_type.clone())];
        self
    }

    /// Same metadata under a different logical name.
    pub fn renamed(&self, name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// One immediate child of a listed directory.
///
/// File entries are transient: they are rebuilt on every listing.
#[derive(Debug, Clone)]
pub enum DirectoryEntry {
    Directory(DirRef),
    File { handle: FileRef, file: FileSnapshot },
}

impl DirectoryEntry {
    /// Bare name of the entry.
    pub fn name(&self) -> &str {
        match self {
            DirectoryEntry::Directory(dir) => dir.name(),
            DirectoryEntry::File { handle, .. } => handle.name(),
        }
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, DirectoryEntry::Directory(_))
    }

    /// File snapshot, if this is a file entry.
    pub fn file(&self) -> Option<&FileSnapshot> {
        match self {
            DirectoryEntry::File { file, .. } => Some(file),
            DirectoryEntry::Directory(_) => None,
        }
    }
}

/// Sort entries with directories first, then by name.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name().cmp(b.name()),
    });
}

/// A file queued for upload under its path relative to the upload root.
///
/// Only the logical name changes; content is still read through the
/// handle it was listed with.
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Slash-joined path relative to the upload root.
    pub path: String,
    /// Capability used to read the content.
    pub handle: FileRef,
    /// Snapshot renamed to `path`.
    pub file: FileSnapshot,
}

impl StagedFile {
    /// Stage a listed file under a relative path.
    pub fn new(path: impl Into<String>, handle: FileRef, file: &FileSnapshot) -> Self {
        let path = path.into();
        let file = file.renamed(path.as_str());
        Self { path, handle, file }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.file.size
    }

    /// Read the full content.
    pub async fn read(&self) -> Result<Vec<u8>, FsError> {
        self.handle.read().await
    }
}
