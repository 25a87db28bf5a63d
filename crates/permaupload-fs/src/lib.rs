//! Directory navigation, tree collection and manifest reconciliation.
//!
//! # Overview
//!
//! - [`DirectoryCursor`] walks a tree of directory capabilities.
//! - [`collect`] gathers every uploadable file below the cursor.
//! - [`read_manifest`] / [`write_manifest`] / [`resolve`] connect files on
//!   disk with the ids recorded by the last upload.
//! - [`Browser`] bundles all of that into a listing session.
//! - [`LocalDirectory`] and [`MemoryDirectory`] are the bundled backends.
//!
//! # Example
//!
//! ```rust,no_run
//! use permaupload_fs::{collect, DirectoryCursor, LocalDirectory};
//! use permaupload_core::CollectConfig;
//!
//! # async fn run() -> Result<(), permaupload_core::FsError> {
//! let root = LocalDirectory::open("/path/to/site").await?.into_ref();
//! let mut cursor = DirectoryCursor::new(root);
//! let files = collect(&mut cursor, &CollectConfig::default()).await?;
//!
//! println!("{} files, {} bytes", files.file_count(), files.total_size);
//! # Ok(())
//! # }
//! ```

mod browser;
mod collector;
mod cursor;
mod lister;
mod local;
mod manifest;
mod memory;
mod store;

pub use browser::{BrowseError, Browser};
pub use collector::collect;
pub use cursor::DirectoryCursor;
pub use lister::list_directory;
pub use local::{LocalDirectory, LocalFile};
pub use manifest::{read_json, read_manifest, read_manifest_in, resolve, write_json, write_manifest};
pub use memory::{MemoryDirectory, MemoryFile};
pub use store::RootStore;

// Re-export core types for convenience
pub use permaupload_core::{
    CollectConfig, DirRef, DirectoryEntry, FileAccumulator, FsError, ManifestData, ManifestInfo,
    NavigationError, StagedFile,
};
