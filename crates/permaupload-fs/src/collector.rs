//! Recursive collection of uploadable files.
//!
//! The walk moves the caller's cursor down into every subdirectory it
//! traverses and back up again, so the cursor ends where it started.
//! Directories are processed one after another because the cursor can only
//! describe one active path at a time.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

use permaupload_core::{
    CollectConfig, CollectWarning, DirectoryEntry, ExcludePattern, FileAccumulator, FsError,
    NavigationError, StagedFile, WarningKind, is_excluded,
};

use crate::cursor::DirectoryCursor;

type LevelFuture<'a> = Pin<Box<dyn Future<Output = Result<FileAccumulator, FsError>> + Send + 'a>>;

/// Collect every non-excluded file below the cursor's working directory.
///
/// Excluded entries are recorded by relative path and never descended into.
/// A subdirectory that cannot be entered or listed is logged, recorded as a
/// warning and skipped; only a failure to list the starting directory is
/// returned as an error.
pub async fn collect(
    cursor: &mut DirectoryCursor,
    config: &CollectConfig,
) -> Result<FileAccumulator, FsError> {
    let walk = Walk {
        patterns: config.effective_patterns(),
        config,
    };
    let acc = walk.level(cursor, String::new(), 0).await?;
    debug!(
        files = acc.file_count(),
        bytes = acc.total_size,
        skipped = acc.skipped.len(),
        "collection finished"
    );
    Ok(acc)
}

struct Walk<'c> {
    patterns: Vec<ExcludePattern>,
    config: &'c CollectConfig,
}

impl Walk<'_> {
    fn level<'a>(&'a self, cursor: &'a mut DirectoryCursor, prefix: String, depth: u32) -> LevelFuture<'a> {
        Box::pin(async move {
            let mut acc = FileAccumulator::new();
            if !self.config.allows_depth(depth) {
                return Ok(acc);
            }

            for entry in cursor.list().await? {
                let name = entry.name().to_string();
                let path = join_path(&prefix, &name);

                if is_excluded(&name, &self.patterns) {
                    debug!(path = %path, "excluded");
                    acc.skip(path);
                    continue;
                }

                match entry {
                    DirectoryEntry::File { handle, file } => {
                        acc.push_file(StagedFile::new(path, handle, &file));
                    }
                    DirectoryEntry::Directory(_) => {
                        if !self.config.allows_depth(depth + 1) {
                            continue;
                        }
                        self.subdirectory(cursor, &name, path, depth + 1, &mut acc).await;
                    }
                }
            }

            Ok(acc)
        })
    }

    async fn subdirectory(
        &self,
        cursor: &mut DirectoryCursor,
        name: &str,
        path: String,
        depth: u32,
        acc: &mut FileAccumulator,
    ) {
        if let Err(err) = cursor.descend(name).await {
            let message = match &err {
                NavigationError::UnreachableSubdirectory { source, .. } => format!("{err}: {source}"),
                other => other.to_string(),
            };
            warn!(path = %path, error = %message, "failed to enter directory");
            acc.warn(CollectWarning::new(path, message, WarningKind::DescendFailed));
            return;
        }

        let result = self.level(cursor, path.clone(), depth).await;

        if let Err(err) = cursor.ascend() {
            warn!(path = %path, error = %err, "cursor unbalanced after traversal");
        }

        match result {
            Ok(child) => acc.merge(child),
            Err(err) => {
                warn!(path = %path, error = %err, "failed to process directory");
                acc.warn(CollectWarning::new(path, err.to_string(), WarningKind::ListFailed));
            }
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
