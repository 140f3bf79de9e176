use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{DuplicatePolicy, RemoteEntry};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Sign-in with passport (phone / email) and password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "type")]
    pub login_type: u8,
    pub passport: String,
    pub password: String,
}

/// Upload negotiation. Also used with `type = 1` to create folders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub drive_id: i64,
    pub etag: String,
    pub file_name: String,
    pub parent_file_id: i64,
    pub size: u64,
    #[serde(rename = "type")]
    pub entry_type: u8,
    pub duplicate: DuplicatePolicy,
}

/// Folder creation through the upload request endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MkdirRequest {
    pub drive_id: i64,
    pub etag: String,
    pub file_name: String,
    pub parent_file_id: i64,
    pub size: u64,
    #[serde(rename = "type")]
    pub entry_type: u8,
    pub duplicate: DuplicatePolicy,
    #[serde(rename = "NotReuse")]
    pub not_reuse: bool,
    pub event: String,
    pub operate_type: u8,
}

impl MkdirRequest {
    pub fn new(name: &str, parent_file_id: i64) -> Self {
        Self {
            drive_id: 0,
            etag: String::new(),
            file_name: name.to_string(),
            parent_file_id,
            size: 0,
            entry_type: 1,
            duplicate: DuplicatePolicy::Overwrite,
            not_reuse: true,
            event: "newCreateFolder".into(),
            operate_type: 1,
        }
    }
}

/// Asks for presigned URLs covering parts `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlsRequest {
    pub bucket: String,
    pub key: String,
    pub part_number_start: u32,
    pub part_number_end: u32,
    pub upload_id: String,
    #[serde(rename = "StorageNode")]
    pub storage_node: String,
}

/// Tells the storage layer to merge all uploaded parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
    #[serde(rename = "StorageNode")]
    pub storage_node: String,
}

/// Final confirmation that the upload is complete.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteRequest {
    pub file_id: i64,
}

/// Download descriptor request for a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadInfoRequest {
    pub drive_id: i64,
    pub etag: String,
    pub file_id: i64,
    #[serde(rename = "s3keyFlag")]
    pub s3key_flag: String,
    #[serde(rename = "type")]
    pub entry_type: u8,
    pub file_name: String,
    pub size: u64,
}

impl From<&RemoteEntry> for DownloadInfoRequest {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            drive_id: 0,
            etag: entry.content_tag.clone(),
            file_id: entry.id,
            s3key_flag: entry.storage_key_flag.clone(),
            entry_type: entry.kind.into(),
            file_name: entry.name.clone(),
            size: entry.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFileRef {
    pub file_id: i64,
}

/// Package download descriptor request for folders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadRequest {
    pub file_id_list: Vec<BatchFileRef>,
}

/// Moves entries to the recycle bin (`operation = true`) or restores them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashRequest {
    pub drive_id: i64,
    pub file_trash_info_list: serde_json::Value,
    pub operation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub drive_id: i64,
    pub expiration: String,
    /// Comma separated file ids.
    pub file_id_list: String,
    pub share_name: String,
    pub share_pwd: String,
    pub event: String,
}

/// Folder details lookup; only the first id is answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderDetailsRequest {
    pub file_ids: Vec<i64>,
}

/// Query parameters of the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub parent_id: i64,
    pub page: u32,
    pub limit: u32,
    pub trashed: bool,
}

impl ListQuery {
    pub fn folder(parent_id: i64, page: u32, limit: u32) -> Self {
        Self {
            parent_id,
            page,
            limit,
            trashed: false,
        }
    }

    pub fn recycle_bin(limit: u32) -> Self {
        Self {
            parent_id: 0,
            page: 1,
            limit,
            trashed: true,
        }
    }

    /// Renders the query string pairs in the server's expected shape.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let order_by = if self.trashed { "fileId" } else { "file_id" };
        let mut pairs = vec![
            ("driveId".to_string(), "0".to_string()),
            ("limit".to_string(), self.limit.to_string()),
            ("next".to_string(), "0".to_string()),
            ("orderBy".to_string(), order_by.to_string()),
            ("orderDirection".to_string(), "desc".to_string()),
            ("parentFileId".to_string(), self.parent_id.to_string()),
            ("trashed".to_string(), self.trashed.to_string()),
            ("Page".to_string(), self.page.to_string()),
        ];
        if !self.trashed {
            pairs.push(("SearchData".to_string(), String::new()));
            pairs.push(("OnlyLookAbnormalFile".to_string(), "0".to_string()));
        }
        pairs
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Answer to an upload negotiation.
///
/// When `reuse` is set the server already holds the content and no other
/// field is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadTicket {
    #[serde(rename = "Reuse", default)]
    pub reuse: bool,
    #[serde(rename = "Bucket", default)]
    pub bucket: String,
    #[serde(rename = "StorageNode", default)]
    pub storage_node: String,
    #[serde(rename = "Key", default)]
    pub key: String,
    #[serde(rename = "UploadId", default)]
    pub upload_id: String,
    #[serde(rename = "FileId", default)]
    pub file_id: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartUrls {
    /// Part number (as a string) to presigned URL.
    #[serde(rename = "presignedUrls")]
    pub presigned_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadDescriptor {
    #[serde(rename = "DownloadUrl")]
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListPage {
    #[serde(rename = "InfoList", default)]
    pub items: Vec<RemoteEntry>,
    #[serde(rename = "Total", default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShareCreated {
    #[serde(rename = "ShareKey")]
    pub share_key: String,
}
