//! In-memory backend.
//!
//! Useful wherever no real filesystem is granted: previews, tests, or a
//! staging area assembled by another component.

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use permaupload_core::{
    DirRef, DirectoryHandle, FileHandle, FileRef, FileSnapshot, FsError, Handle,
};

#[derive(Debug, Clone)]
enum MemoryNode {
    Directory(Arc<MemoryDirectory>),
    File(Arc<MemoryFile>),
    Foreign(Handle),
}

impl MemoryNode {
    fn name(&self) -> &str {
        match self {
            MemoryNode::Directory(dir) => &dir.name,
            MemoryNode::File(file) => &file.name,
            MemoryNode::Foreign(handle) => handle.name(),
        }
    }

    fn to_handle(&self) -> Handle {
        match self {
            MemoryNode::Directory(dir) => Handle::Directory(dir.clone()),
            MemoryNode::File(file) => Handle::File(file.clone()),
            MemoryNode::Foreign(handle) => handle.clone(),
        }
    }
}

/// A directory held entirely in memory.
#[derive(Debug)]
pub struct MemoryDirectory {
    name: String,
    children: RwLock<Vec<MemoryNode>>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            children: RwLock::new(Vec::new()),
        })
    }

    /// Add or replace a file.
    pub async fn add_file(&self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Arc<MemoryFile> {
        let file = Arc::new(MemoryFile::new(name, contents.into()));
        self.replace(MemoryNode::File(file.clone())).await;
        file
    }

    /// Return the named subdirectory, creating it if needed.
    pub async fn add_directory(&self, name: impl Into<String>) -> Arc<MemoryDirectory> {
        let name = name.into();
        let mut children = self.children.write().await;
        if let Some(MemoryNode::Directory(dir)) = children.iter().find(|c| c.name() == name) {
            return dir.clone();
        }
        let dir = MemoryDirectory::new(name.clone());
        children.retain(|c| c.name() != name);
        children.push(MemoryNode::Directory(dir.clone()));
        dir
    }

    /// Mount any other capability as a child.
    pub async fn insert(&self, handle: Handle) {
        self.replace(MemoryNode::Foreign(handle)).await;
    }

    /// Remove a child. Returns whether it existed.
    pub async fn remove(&self, name: &str) -> bool {
        let mut children = self.children.write().await;
        let before = children.len();
        children.retain(|c| c.name() != name);
        children.len() != before
    }

    /// Write a file at a slash-separated path, creating directories on the way.
    pub async fn write_path(&self, path: &str, contents: impl Into<Vec<u8>>) -> Arc<MemoryFile> {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let file_name = segments.pop().unwrap_or_default().to_string();

        let mut dir: Option<Arc<MemoryDirectory>> = None;
        for segment in segments {
            let next = match &dir {
                Some(d) => d.add_directory(segment).await,
                None => self.add_directory(segment).await,
            };
            dir = Some(next);
        }

        match dir {
            Some(d) => d.add_file(file_name, contents).await,
            None => self.add_file(file_name, contents).await,
        }
    }

    async fn replace(&self, node: MemoryNode) {
        let mut children = self.children.write().await;
        children.retain(|c| c.name() != node.name());
        children.push(node);
    }
}

#[async_trait]
impl DirectoryHandle for MemoryDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<Handle>, FsError> {
        Ok(self.children.read().await.iter().map(MemoryNode::to_handle).collect())
    }

    async fn get_directory(&self, name: &str) -> Result<DirRef, FsError> {
        let children = self.children.read().await;
        match children.iter().find(|c| c.name() == name).map(MemoryNode::to_handle) {
            Some(Handle::Directory(dir)) => Ok(dir),
            Some(Handle::File(_)) => Err(FsError::NotADirectory { path: name.into() }),
            None => Err(FsError::NotFound { path: name.into() }),
        }
    }

    async fn get_file(&self, name: &str, create: bool) -> Result<FileRef, FsError> {
        let existing = self
            .children
            .read()
            .await
            .iter()
            .find(|c| c.name() == name)
            .map(MemoryNode::to_handle);

        match existing {
            Some(Handle::File(file)) => Ok(file),
            Some(Handle::Directory(_)) => Err(FsError::NotAFile { path: name.into() }),
            None if create => Ok(self.add_file(name, Vec::new()).await),
            None => Err(FsError::NotFound { path: name.into() }),
        }
    }
}

#[derive(Debug)]
struct FileState {
    contents: Vec<u8>,
    modified: SystemTime,
}

/// A file held entirely in memory.
#[derive(Debug)]
pub struct MemoryFile {
    name: String,
    state: RwLock<FileState>,
}

impl MemoryFile {
    fn new(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(FileState {
                contents,
                modified: SystemTime::now(),
            }),
        }
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn snapshot(&self) -> Result<FileSnapshot, FsError> {
        let state = self.state.read().await;
        Ok(FileSnapshot::new(
            self.name.as_str(),
            state.contents.len() as u64,
            Some(state.modified),
        ))
    }

    async fn read(&self) -> Result<Vec<u8>, FsError> {
        Ok(self.state.read().await.contents.clone())
    }

    async fn write(&self, contents: &[u8]) -> Result<(), FsError> {
        let mut state = self.state.write().await;
        state.contents = contents.to_vec();
        state.modified = SystemTime::now();
        Ok(())
    }
}
