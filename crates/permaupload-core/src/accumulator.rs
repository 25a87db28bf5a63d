//! Result of a tree collection.

use crate::entry::StagedFile;
use crate::error::CollectWarning;

/// Files gathered by one collection walk.
///
/// Each recursion level builds its own accumulator and the parent merges it,
/// so an accumulator is never shared between walks.
#[derive(Debug, Default)]
pub struct FileAccumulator {
    /// Staged files in traversal order.
    pub files: Vec<StagedFile>,
    /// Sum of the staged file sizes.
    pub total_size: u64,
    /// Relative paths that matched an exclusion rule.
    pub skipped: Vec<String>,
    /// Subdirectories that could not be traversed.
    pub warnings: Vec<CollectWarning>,
}

impl FileAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a staged file and count its size.
    pub fn push_file(&mut self, file: StagedFile) {
        self.total_size += file.size();
        self.files.push(file);
    }

    /// Record an excluded path.
    pub fn skip(&mut self, path: impl Into<String>) {
        self.skipped.push(path.into());
    }

    /// Record a non-fatal traversal failure.
    pub fn warn(&mut self, warning: CollectWarning) {
        self.warnings.push(warning);
    }

    /// Append everything a child walk gathered.
    pub fn merge(&mut self, child: FileAccumulator) {
        self.files.extend(child.files);
        self.total_size += child.total_size;
        self.skipped.extend(child.skipped);
        self.warnings.extend(child.warnings);
    }

    /// Number of staged files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Relative paths of the staged files.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Check if any subdirectory failed.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
