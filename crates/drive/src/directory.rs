//! Recursive folder download with per-entry fault isolation.

use std::path::{Path, PathBuf};

use pan123_protocol::{ExistingFilePolicy, RemoteEntry};
use pan123_transfer::{ProgressFn, TransferEvent, emit, validate_entry_name};
use tracing::{info, warn};

use crate::Drive;
use crate::download::DownloadOutcome;
use crate::error::DriveError;

/// Nesting limit below the requested folder.
pub const MAX_DEPTH: usize = 64;

/// A folder whose children are still being walked.
struct Frame {
    dir: PathBuf,
    /// Path relative to the requested folder, `""` at its top.
    label: String,
    children: std::vec::IntoIter<RemoteEntry>,
    depth: usize,
}

impl Frame {
    fn label_for(&self, name: &str) -> String {
        if self.label.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.label)
        }
    }
}

impl Drive<'_> {
    /// Downloads `folder` into `save_dir/<folder name>`.
    ///
    /// Children are visited depth first in listing order. A failing child is
    /// recorded as `relative/path: reason` and its siblings still run; if
    /// anything failed the call returns [`DriveError::Partial`] carrying the
    /// created directory. A failure to list `folder` itself is returned
    /// as is.
    pub async fn download_directory(
        &self,
        folder: &RemoteEntry,
        save_dir: &Path,
        policy: ExistingFilePolicy,
        progress: Option<&ProgressFn>,
    ) -> Result<DownloadOutcome, DriveError> {
        if !folder.is_folder() {
            return Err(DriveError::Precondition(format!(
                "not a folder: {}",
                folder.name
            )));
        }

        let (root, children) = self.open_folder(folder, save_dir).await?;
        if children.is_empty() {
            info!(path = %root.display(), "folder is empty");
            return Ok(DownloadOutcome::EmptyFolder(root));
        }

        let mut failures = Vec::new();
        let mut stack = vec![Frame {
            dir: root.clone(),
            label: String::new(),
            children: children.into_iter(),
            depth: 0,
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let parent_dir = frame.dir.clone();
            let label = frame.label_for(&child.name);
            let depth = frame.depth;

            if child.is_folder() {
                emit(
                    progress,
                    TransferEvent::DownloadStartDirectory {
                        name: child.name.clone(),
                    },
                );
                if depth + 1 > MAX_DEPTH {
                    failures.push(format!("{label}: nested deeper than {MAX_DEPTH} levels"));
                    continue;
                }
                match self.open_folder(&child, &parent_dir).await {
                    Ok((dir, grandchildren)) => stack.push(Frame {
                        dir,
                        label,
                        children: grandchildren.into_iter(),
                        depth: depth + 1,
                    }),
                    Err(e) => failures.push(format!("{label}: {e}")),
                }
            } else {
                emit(
                    progress,
                    TransferEvent::DownloadStartFile {
                        name: child.name.clone(),
                        size: child.size,
                    },
                );
                match self.download_file(&child, &parent_dir, policy, progress).await {
                    Ok(DownloadOutcome::Conflict(_)) => {
                        failures.push(format!("{label}: file already exists"));
                    }
                    Ok(_) => {}
                    Err(e) => failures.push(format!("{label}: {e}")),
                }
            }
        }

        if failures.is_empty() {
            info!(path = %root.display(), "folder download complete");
            Ok(DownloadOutcome::Folder(root))
        } else {
            warn!(path = %root.display(), failed = failures.len(), "folder partially downloaded");
            Err(DriveError::Partial {
                path: root,
                failures,
            })
        }
    }

    async fn download_file(
        &self,
        entry: &RemoteEntry,
        dir: &Path,
        policy: ExistingFilePolicy,
        progress: Option<&ProgressFn>,
    ) -> Result<DownloadOutcome, DriveError> {
        let url = self.resolve_direct_link(entry).await?;
        self.download_to_file(&url, &entry.name, dir, policy, progress)
            .await
    }

    /// Creates the local directory for `folder` and lists its children.
    async fn open_folder(
        &self,
        folder: &RemoteEntry,
        parent_dir: &Path,
    ) -> Result<(PathBuf, Vec<RemoteEntry>), DriveError> {
        validate_entry_name(&folder.name)?;
        let dir = parent_dir.join(&folder.name);
        tokio::fs::create_dir_all(&dir).await?;
        let listing = self.client.list_all(folder.id).await?;
        Ok((dir, listing.items))
    }
}
