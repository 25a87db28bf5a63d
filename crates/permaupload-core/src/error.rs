//! Error types for navigation, traversal and manifest handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by directory and file capabilities.
#[derive(Debug, Error)]
pub enum FsError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Entry not found.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Entry exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    /// Entry exists but is not a regular file.
    #[error("Not a file: {path}")]
    NotAFile { path: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl FsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a free-form error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Errors raised while moving the directory cursor.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// The named child is missing or is not a directory.
    #[error("unreachable subdirectory")]
    UnreachableSubdirectory {
        name: String,
        #[source]
        source: FsError,
    },

    /// Ascend was attempted while only the root remains.
    #[error("can't go higher than root")]
    AboveRoot,

    /// A breadcrumb index past the current depth was requested.
    #[error("breadcrumb index {index} out of range (depth {depth})")]
    IndexOutOfRange { index: usize, depth: usize },
}

/// Errors raised while reading or writing JSON documents such as the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The document could not be read or written.
    #[error("Failed to access {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: FsError,
    },

    /// The document is not JSON of the expected shape, or could not be encoded.
    #[error("JSON error in {file_name}: {source}")]
    Json {
        file_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Kind of collection warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Entering a subdirectory failed.
    DescendFailed,
    /// Listing a subdirectory failed after entering it.
    ListFailed,
}

/// Non-fatal failure recorded while collecting a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectWarning {
    /// Relative path of the subdirectory that failed.
    pub path: String,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl CollectWarning {
    /// Create a new collection warning.
    pub fn new(path: impl Into<String>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_io() {
        let err = FsError::io(
            "photos/raw",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, FsError::PermissionDenied { .. }));

        let err = FsError::io(
            "photos/raw",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn test_navigation_messages() {
        assert_eq!(
            NavigationError::AboveRoot.to_string(),
            "can't go higher than root"
        );
        let err = NavigationError::UnreachableSubdirectory {
            name: "missing".into(),
            source: FsError::NotFound {
                path: "missing".into(),
            },
        };
        assert_eq!(err.to_string(), "unreachable subdirectory");
    }
}
