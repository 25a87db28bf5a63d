//! Reading, writing and resolving the path manifest.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use permaupload_core::{
    DirRef, DirectoryEntry, MANIFEST_FILE_NAME, ManifestData, ManifestError, ManifestInfo,
};

use crate::cursor::DirectoryCursor;

/// Read and decode a JSON file from `dir`.
pub async fn read_json<T: DeserializeOwned>(dir: &DirRef, file_name: &str) -> Result<T, ManifestError> {
    let file = dir
        .get_file(file_name, false)
        .await
        .map_err(|source| ManifestError::Io {
            file_name: file_name.to_string(),
            source,
        })?;
    let bytes = file.read().await.map_err(|source| ManifestError::Io {
        file_name: file_name.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ManifestError::Json {
        file_name: file_name.to_string(),
        source,
    })
}

/// Encode `data` as pretty-printed JSON into `dir`, replacing any existing file.
pub async fn write_json<T: Serialize + ?Sized>(
    dir: &DirRef,
    file_name: &str,
    data: &T,
) -> Result<(), ManifestError> {
    let json = serde_json::to_vec_pretty(data).map_err(|source| ManifestError::Json {
        file_name: file_name.to_string(),
        source,
    })?;
    let io_error = |source| ManifestError::Io {
        file_name: file_name.to_string(),
        source,
    };
    let file = dir.get_file(file_name, true).await.map_err(io_error)?;
    file.write(&json).await.map_err(io_error)
}

/// Read the manifest of the cursor's working directory.
///
/// A missing file and a file of the wrong shape both yield `None`.
pub async fn read_manifest(cursor: &DirectoryCursor) -> Option<ManifestData> {
    read_manifest_in(cursor.current()).await
}

/// Read the manifest stored directly in `dir`.
pub async fn read_manifest_in(dir: &DirRef) -> Option<ManifestData> {
    match read_json::<ManifestData>(dir, MANIFEST_FILE_NAME).await {
        Ok(manifest) => Some(manifest),
        Err(ManifestError::Json { source, .. }) => {
            warn!(directory = dir.name(), error = %source, "invalid manifest format");
            None
        }
        Err(err) => {
            debug!(directory = dir.name(), error = %err, "no manifest");
            None
        }
    }
}

/// Write the manifest into `directory`, or the cursor's working directory.
pub async fn write_manifest(
    cursor: &DirectoryCursor,
    manifest: &ManifestData,
    directory: Option<&DirRef>,
) -> Result<(), ManifestError> {
    let dir = directory.unwrap_or_else(|| cursor.current());
    write_json(dir, MANIFEST_FILE_NAME, manifest).await?;
    debug!(directory = dir.name(), paths = manifest.len(), "manifest written");
    Ok(())
}

/// Remote record of a listed file, if the manifest knows its path.
///
/// `current_path` is the listed directory relative to the upload root.
/// Paths are matched verbatim: a file moved since the last upload resolves
/// to nothing, and a different file now at an old path resolves to the old id.
pub fn resolve(
    entry: &DirectoryEntry,
    current_path: &str,
    manifest: Option<&ManifestData>,
    gateway: &str,
) -> Option<ManifestInfo> {
    let manifest = manifest?;
    let file = entry.file()?;
    let relative = if current_path.is_empty() {
        file.name.to_string()
    } else {
        format!("{current_path}/{}", file.name)
    };
    manifest.lookup(&relative, gateway)
}
