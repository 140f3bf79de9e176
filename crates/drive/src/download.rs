//! Direct-link resolution and atomic streamed download.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use futures_util::StreamExt;
use pan123_client::{ApiError, Probe};
use pan123_protocol::constants::{
    CODE_CONFLICT, CODE_OK, DOWNLOAD_CHUNK_SIZE, TIMEOUT_DEFAULT, URL_BATCH_DOWNLOAD,
    URL_DOWNLOAD_INFO,
};
use pan123_protocol::messages::{
    BatchDownloadRequest, BatchFileRef, DownloadDescriptor, DownloadInfoRequest,
};
use pan123_protocol::{ExistingFilePolicy, RemoteEntry, Report};
use pan123_transfer::{
    DownloadTarget, ProgressFn, Throughput, TransferEvent, emit, validate_entry_name,
};
use regex::Regex;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::Drive;
use crate::error::DriveError;

/// Link embedded in the HTML page some descriptors answer with.
static EMBEDDED_HREF: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"href='(https?://[^']+)'").ok());

/// How a download finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Saved(PathBuf),
    /// The destination existed and the policy was [`ExistingFilePolicy::Skip`].
    Skipped(PathBuf),
    /// The destination existed and was left alone. Retry with overwrite or
    /// skip.
    Conflict(PathBuf),
    /// A folder was downloaded completely.
    Folder(PathBuf),
    /// The folder had no entries; only the local directory was created.
    EmptyFolder(PathBuf),
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Saved(p)
            | Self::Skipped(p)
            | Self::Conflict(p)
            | Self::Folder(p)
            | Self::EmptyFolder(p) => p,
        }
    }
}

impl Report for DownloadOutcome {
    fn code(&self) -> i32 {
        match self {
            Self::Conflict(_) => CODE_CONFLICT,
            _ => CODE_OK,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Saved(_) => "download complete".into(),
            Self::Skipped(_) => "file exists, skipped".into(),
            Self::Conflict(p) => format!("{} already exists", p.display()),
            Self::Folder(_) => "folder download complete".into(),
            Self::EmptyFolder(_) => "folder is empty".into(),
        }
    }
}

/// Picks the real link out of a probe: the `Location` of a redirect, else
/// the first `href='http…'` in the body.
pub fn extract_direct_link(probe: &Probe) -> Option<String> {
    if probe.is_redirect()
        && let Some(location) = probe.location.as_deref()
        && !location.is_empty()
    {
        return Some(location.to_string());
    }
    EMBEDDED_HREF
        .as_ref()?
        .captures(&probe.body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

impl Drive<'_> {
    /// Resolves the direct download link of a file, or of the server-side
    /// package of a folder.
    pub async fn resolve_direct_link(&self, entry: &RemoteEntry) -> Result<String, DriveError> {
        let env = if entry.is_folder() {
            let req = BatchDownloadRequest {
                file_id_list: vec![BatchFileRef { file_id: entry.id }],
            };
            self.client
                .post_json(URL_BATCH_DOWNLOAD, &req, TIMEOUT_DEFAULT)
                .await?
        } else {
            let req = DownloadInfoRequest::from(entry);
            self.client
                .post_json(URL_DOWNLOAD_INFO, &req, TIMEOUT_DEFAULT)
                .await?
        };
        let descriptor: DownloadDescriptor = env.parse_data().map_err(ApiError::from)?;

        let probe = self
            .client
            .transport()
            .probe(&descriptor.download_url)
            .await?;
        let link = extract_direct_link(&probe).ok_or_else(|| {
            DriveError::Resolve(format!(
                "no redirect or embedded link (HTTP {})",
                probe.status
            ))
        })?;
        debug!(file_id = entry.id, status = probe.status, "direct link resolved");
        Ok(link)
    }

    /// Streams `url` into `save_dir/file_name`.
    ///
    /// Data goes to a unique temporary sibling first and is renamed into
    /// place only once complete; on any error the temporary file is removed
    /// and the destination is untouched.
    pub async fn download_to_file(
        &self,
        url: &str,
        file_name: &str,
        save_dir: &Path,
        policy: ExistingFilePolicy,
        progress: Option<&ProgressFn>,
    ) -> Result<DownloadOutcome, DriveError> {
        validate_entry_name(file_name)?;
        tokio::fs::create_dir_all(save_dir).await?;
        let final_path = save_dir.join(file_name);

        if tokio::fs::try_exists(&final_path).await? {
            match policy {
                ExistingFilePolicy::Skip => {
                    debug!(path = %final_path.display(), "exists, skipping");
                    return Ok(DownloadOutcome::Skipped(final_path));
                }
                ExistingFilePolicy::Conflict => {
                    return Ok(DownloadOutcome::Conflict(final_path));
                }
                ExistingFilePolicy::Overwrite => tokio::fs::remove_file(&final_path).await?,
            }
        }

        let mut target = DownloadTarget::new(url, final_path);
        let result = match self.stream_to_temp(&mut target, progress).await {
            Ok(()) => tokio::fs::rename(&target.temp_path, &target.final_path)
                .await
                .map_err(DriveError::from),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            if let Err(rm) = tokio::fs::remove_file(&target.temp_path).await
                && rm.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %target.temp_path.display(), error = %rm, "failed to remove temp file");
            }
            return Err(e);
        }

        info!(
            path = %target.final_path.display(),
            bytes = target.received,
            "download complete"
        );
        Ok(DownloadOutcome::Saved(target.final_path))
    }

    async fn stream_to_temp(
        &self,
        target: &mut DownloadTarget,
        progress: Option<&ProgressFn>,
    ) -> Result<(), DriveError> {
        let mut download = self.client.transport().fetch(&target.url).await?;
        target.expected = download.content_length.unwrap_or(0);
        let throughput = Throughput::start();

        let mut file = tokio::fs::File::create(&target.temp_path).await?;
        while let Some(chunk) = download.body.next().await {
            let chunk = chunk?;
            for block in chunk.chunks(DOWNLOAD_CHUNK_SIZE) {
                file.write_all(block).await?;
                target.received += block.len() as u64;
                emit(
                    progress,
                    TransferEvent::DownloadProgress {
                        downloaded: target.received,
                        total: target.expected,
                        bytes_per_second: throughput.bytes_per_second(target.received),
                    },
                );
            }
        }
        file.flush().await?;
        Ok(())
    }

    /// Downloads a file, or a whole folder through
    /// [`Drive::download_directory`].
    pub async fn download_entry(
        &self,
        entry: &RemoteEntry,
        save_dir: &Path,
        policy: ExistingFilePolicy,
        progress: Option<&ProgressFn>,
    ) -> Result<DownloadOutcome, DriveError> {
        if entry.is_folder() {
            return self
                .download_directory(entry, save_dir, policy, progress)
                .await;
        }
        let url = self.resolve_direct_link(entry).await?;
        self.download_to_file(&url, &entry.name, save_dir, policy, progress)
            .await
    }
}
