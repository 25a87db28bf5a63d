//! Core types and traits for permaupload.
//!
//! This crate provides the capability traits every backend implements, the
//! entry and accumulator types produced by listing and collection, the
//! exclusion configuration, and the path manifest document.

mod accumulator;
mod capability;
mod config;
mod entry;
mod error;
mod manifest;
mod mime;

pub use accumulator::FileAccumulator;
pub use capability::{DirRef, DirectoryHandle, FileHandle, FileRef, Handle};
pub use config::{
    CollectConfig, CollectConfigBuilder, ExcludePattern, default_exclude_patterns, is_excluded,
};
pub use entry::{DirectoryEntry, FileSnapshot, StagedFile, Tag, sort_entries};
pub use error::{CollectWarning, FsError, ManifestError, NavigationError, WarningKind};
pub use manifest::{
    DEFAULT_GATEWAY, MANIFEST_FILE_NAME, MANIFEST_VERSION, ManifestData, ManifestInfo,
    ManifestKind, ManifestPath,
};
pub use mime::{CONTENT_TYPE_TAG, content_type_for};
