//! Stack based cursor over a directory tree.

use tracing::debug;

use permaupload_core::{DirRef, DirectoryEntry, FsError, NavigationError};

use crate::lister::list_directory;

/// Cursor tracking the path from a root directory to the working directory.
///
/// The cursor is shared mutable state: listing, collecting and navigating
/// all move it, and every method that does so takes `&mut self`. Callers
/// that walk into a subdirectory must ascend again before handing the
/// cursor to anyone else, including on error paths. A collector running
/// over several roots at once needs one cursor per root.
#[derive(Debug, Clone)]
pub struct DirectoryCursor {
    root: DirRef,
    /// Directories below the root, outermost first.
    stack: Vec<DirRef>,
}

impl DirectoryCursor {
    /// Create a cursor positioned at `root`.
    pub fn new(root: DirRef) -> Self {
        Self {
            root,
            stack: Vec::new(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &DirRef {
        &self.root
    }

    /// The working directory.
    pub fn current(&self) -> &DirRef {
        self.stack.last().unwrap_or(&self.root)
    }

    /// Enter a child directory of the working directory.
    pub async fn descend(&mut self, name: &str) -> Result<DirRef, NavigationError> {
        let dir = self
            .current()
            .get_directory(name)
            .await
            .map_err(|source| NavigationError::UnreachableSubdirectory {
                name: name.to_string(),
                source,
            })?;
        self.stack.push(dir.clone());
        debug!(path = %self.full_path(), "descended");
        Ok(dir)
    }

    /// Leave the working directory. Fails without side effects at the root.
    pub fn ascend(&mut self) -> Result<DirRef, NavigationError> {
        let dir = self.stack.pop().ok_or(NavigationError::AboveRoot)?;
        debug!(path = %self.full_path(), "ascended");
        Ok(dir)
    }

    /// Return to the root.
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Check if the working directory is the root.
    pub fn is_at_root(&self) -> bool {
        self.stack.is_empty()
    }

    /// Directories from the root to the working directory, root first.
    pub fn directories(&self) -> impl Iterator<Item = &DirRef> {
        std::iter::once(&self.root).chain(self.stack.iter())
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Directory names from the root to the working directory, root included.
    pub fn path_segments(&self) -> Vec<String> {
        std::iter::once(&self.root)
            .chain(self.stack.iter())
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Segments joined with a trailing `/` after each, e.g. `site/img/`.
    pub fn full_path(&self) -> String {
        self.path_segments()
            .iter()
            .fold(String::new(), |path, name| path + name + "/")
    }

    /// Path of the working directory relative to the root, e.g. `img/icons`.
    pub fn relative_path(&self) -> String {
        self.stack
            .iter()
            .map(|d| d.name())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// List the immediate children of the working directory.
    pub async fn list(&self) -> Result<Vec<DirectoryEntry>, FsError> {
        list_directory(self.current()).await
    }
}
