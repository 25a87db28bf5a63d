//! Browsing session over a root directory.
//!
//! This is the surface a user interface binds to: breadcrumb segments, the
//! sorted listing of the working directory, per-file manifest info and a
//! refresh counter that changes whenever the listing has been rebuilt.

use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use permaupload_core::{
    DEFAULT_GATEWAY, DirRef, DirectoryEntry, FsError, ManifestData, ManifestInfo, NavigationError,
    sort_entries,
};

use crate::cursor::DirectoryCursor;
use crate::manifest::{read_manifest_in, resolve};

/// Errors from browsing operations.
#[derive(Debug, Error)]
pub enum BrowseError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Listing state of one root directory.
#[derive(Debug)]
pub struct Browser {
    cursor: DirectoryCursor,
    gateway: String,
    entries: Vec<DirectoryEntry>,
    manifest_id: Option<String>,
    manifest_info: IndexMap<String, ManifestInfo>,
    path_items: Vec<String>,
    current_path: String,
    refresh_tx: watch::Sender<u64>,
}

impl Browser {
    /// Create a session at `root`. Nothing is listed until [`Browser::refresh`].
    pub fn new(root: DirRef) -> Self {
        let cursor = DirectoryCursor::new(root);
        let path_items = cursor.path_segments();
        let (refresh_tx, _) = watch::channel(0);
        Self {
            cursor,
            gateway: DEFAULT_GATEWAY.to_string(),
            entries: Vec::new(),
            manifest_id: None,
            manifest_info: IndexMap::new(),
            path_items,
            current_path: String::new(),
            refresh_tx,
        }
    }

    /// Use a different gateway for public URLs.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    /// Create a session and list the root.
    pub async fn open(root: DirRef) -> Result<Self, FsError> {
        let mut browser = Self::new(root);
        browser.refresh().await?;
        Ok(browser)
    }

    /// Rebuild the listing of the working directory.
    ///
    /// The manifest is re-read from disk each time: the nearest one found
    /// walking from the working directory up to the root is used, with paths
    /// taken relative to the directory that holds it.
    pub async fn refresh(&mut self) -> Result<(), FsError> {
        let mut entries = self.cursor.list().await?;
        let (manifest, prefix) = self.nearest_manifest().await;

        let manifest_info: IndexMap<String, ManifestInfo> = entries
            .iter()
            .filter_map(|entry| {
                resolve(entry, &prefix, manifest.as_ref(), &self.gateway)
                    .map(|info| (entry.name().to_string(), info))
            })
            .collect();

        sort_entries(&mut entries);

        self.entries = entries;
        self.manifest_id = manifest.and_then(|m| m.manifest_id);
        self.manifest_info = manifest_info;
        self.path_items = self.cursor.path_segments();
        self.current_path = self.cursor.relative_path();
        self.refresh_tx.send_modify(|count| *count += 1);

        debug!(
            path = %self.cursor.full_path(),
            entries = self.entries.len(),
            resolved = self.manifest_info.len(),
            "listing refreshed"
        );
        Ok(())
    }

    /// Jump to breadcrumb `index` (0 = root) and refresh.
    pub async fn navigate_to_index(&mut self, index: usize) -> Result<(), BrowseError> {
        let segments = self.cursor.path_segments();
        if index >= segments.len() {
            return Err(NavigationError::IndexOutOfRange {
                index,
                depth: segments.len() - 1,
            }
            .into());
        }

        self.cursor.reset();
        let mut outcome = Ok(());
        for name in &segments[1..=index] {
            if let Err(err) = self.cursor.descend(name).await {
                warn!(name = %name, error = %err, "failed to navigate");
                outcome = Err(err.into());
                break;
            }
        }

        self.refresh().await?;
        outcome
    }

    /// Enter a child directory of the working directory and refresh.
    ///
    /// `dir` is usually taken from [`Browser::entries`]; the child of the
    /// working directory with the same name is entered.
    pub async fn navigate_to_directory(&mut self, dir: &DirRef) -> Result<(), BrowseError> {
        let name = dir.name();
        if let Err(err) = self.cursor.descend(name).await {
            warn!(name = %name, error = %err, "failed to navigate");
            return Err(err.into());
        }
        self.refresh().await?;
        Ok(())
    }

    /// The underlying cursor.
    pub fn cursor(&self) -> &DirectoryCursor {
        &self.cursor
    }

    /// Mutable access to the cursor, e.g. to collect from it.
    ///
    /// Listing state is stale until the next refresh.
    pub fn cursor_mut(&mut self) -> &mut DirectoryCursor {
        &mut self.cursor
    }

    /// Entries of the working directory, directories first then by name.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Listed subdirectory of the working directory with this name.
    pub fn directory(&self, name: &str) -> Option<DirRef> {
        self.entries.iter().find_map(|entry| match entry {
            DirectoryEntry::Directory(dir) if dir.name() == name => Some(dir.clone()),
            _ => None,
        })
    }

    /// Top-level id of the manifest in effect, if any.
    pub fn manifest_id(&self) -> Option<&str> {
        self.manifest_id.as_deref()
    }

    /// Manifest info keyed by entry name.
    pub fn manifest_info(&self) -> &IndexMap<String, ManifestInfo> {
        &self.manifest_info
    }

    /// Breadcrumb segments, root first.
    pub fn path_items(&self) -> &[String] {
        &self.path_items
    }

    /// Working directory relative to the root.
    pub fn current_path(&self) -> &str {
        &self.current_path
    }

    /// Gateway used for public URLs.
    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    /// Number of completed refreshes.
    pub fn refresh_count(&self) -> u64 {
        *self.refresh_tx.borrow()
    }

    /// Watch the refresh counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresh_tx.subscribe()
    }

    async fn nearest_manifest(&self) -> (Option<ManifestData>, String) {
        let dirs: Vec<&DirRef> = self.cursor.directories().collect();
        for (level, dir) in dirs.iter().enumerate().rev() {
            if let Some(manifest) = read_manifest_in(dir).await {
                let prefix = dirs[level + 1..]
                    .iter()
                    .map(|d| d.name())
                    .collect::<Vec<_>>()
                    .join("/");
                return (Some(manifest), prefix);
            }
        }
        (None, String::new())
    }
}
