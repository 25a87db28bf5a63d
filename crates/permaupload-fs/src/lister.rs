//! Listing of a single directory level.

use permaupload_core::{DirRef, DirectoryEntry, FsError, Handle};

/// List the immediate children of `dir`.
///
/// Every file child gets a fresh metadata snapshot tagged with its content
/// type. Order is whatever the backend yields; use
/// [`permaupload_core::sort_entries`] for display order.
pub async fn list_directory(dir: &DirRef) -> Result<Vec<DirectoryEntry>, FsError> {
    let handles = dir.entries().await?;
    let mut entries = Vec::with_capacity(handles.len());

    for handle in handles {
        match handle {
            Handle::Directory(dir) => entries.push(DirectoryEntry::Directory(dir)),
            Handle::File(handle) => {
                let file = handle.snapshot().await?.tagged();
                entries.push(DirectoryEntry::File { handle, file });
            }
        }
    }

    Ok(entries)
}
