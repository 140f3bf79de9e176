use std::path::{Path, PathBuf};

use pan123_protocol::constants::TEMP_SUFFIX;

/// State of one multipart upload call.
///
/// Lives only for the duration of the call; on failure it is dropped and the
/// next attempt negotiates from scratch.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub local_path: PathBuf,
    pub total_bytes: u64,
    pub digest: String,
    pub bucket: String,
    pub storage_node: String,
    pub object_key: String,
    pub upload_id: String,
    pub remote_file_id: i64,
    part_number: u32,
    bytes_sent: u64,
}

impl UploadSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local_path: PathBuf,
        total_bytes: u64,
        digest: String,
        bucket: String,
        storage_node: String,
        object_key: String,
        upload_id: String,
        remote_file_id: i64,
    ) -> Self {
        Self {
            local_path,
            total_bytes,
            digest,
            bucket,
            storage_node,
            object_key,
            upload_id,
            remote_file_id,
            part_number: 1,
            bytes_sent: 0,
        }
    }

    /// Part number of the next chunk to send (starts at 1).
    pub fn part_number(&self) -> u32 {
        self.part_number
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Bytes still owed against the size declared at negotiation.
    pub fn remaining(&self) -> u64 {
        self.total_bytes.saturating_sub(self.bytes_sent)
    }

    /// Records a successfully sent part and advances to the next number.
    pub fn record_part(&mut self, len: usize) {
        self.bytes_sent += len as u64;
        self.part_number += 1;
    }
}

/// Destination bookkeeping for one streamed download.
#[derive(Debug, Clone)]
pub struct DownloadTarget {
    pub url: String,
    pub final_path: PathBuf,
    /// Sibling of `final_path`, unique per call.
    pub temp_path: PathBuf,
    /// From `Content-Length`; `0` when unknown.
    pub expected: u64,
    pub received: u64,
}

impl DownloadTarget {
    pub fn new(url: impl Into<String>, final_path: PathBuf) -> Self {
        let temp_path = temp_path_for(&final_path);
        Self {
            url: url.into(),
            final_path,
            temp_path,
            expected: 0,
            received: 0,
        }
    }
}

/// `<final>.<8 hex>.123pan`, unique so concurrent downloads of the same name
/// never share a temporary file.
fn temp_path_for(final_path: &Path) -> PathBuf {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let mut name = final_path.as_os_str().to_os_string();
    name.push(format!(".{}.{TEMP_SUFFIX}", &tag[..8]));
    PathBuf::from(name)
}
