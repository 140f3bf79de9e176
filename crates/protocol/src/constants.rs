//! Endpoint paths, timeouts, transfer sizes and result codes.

use std::time::Duration;

/// API origin all relative endpoint paths are joined to.
pub const API_BASE_URL: &str = "https://www.123pan.com";

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

pub const URL_LOGIN: &str = "/b/api/user/sign_in";
pub const URL_USER_INFO: &str = "/b/api/user/info";
pub const URL_FILE_LIST: &str = "/api/file/list/new";
pub const URL_FILE_TRASH: &str = "/a/api/file/trash";
pub const URL_SHARE_CREATE: &str = "/a/api/share/create";
pub const URL_DOWNLOAD_INFO: &str = "/a/api/file/download_info";
/// Folder downloads are packaged server-side.
pub const URL_BATCH_DOWNLOAD: &str = "/a/api/file/batch_download_info";
pub const URL_UPLOAD_REQUEST: &str = "/b/api/file/upload_request";
/// Presigned part URLs. The misspelling is the server's.
pub const URL_UPLOAD_PARTS: &str = "/b/api/file/s3_repare_upload_parts_batch";
pub const URL_UPLOAD_MERGE: &str = "/b/api/file/s3_complete_multipart_upload";
pub const URL_UPLOAD_COMPLETE: &str = "/b/api/file/upload_complete";
/// Directory creation reuses the upload request endpoint with `type = 1`.
pub const URL_MKDIR: &str = "/a/api/file/upload_request";
pub const URL_FOLDER_DETAILS: &str = "/b/api/restful/goapi/v1/file/details";

/// Builds the public share link for a share key.
pub fn share_url(key: &str) -> String {
    format!("{API_BASE_URL}/s/{key}")
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

pub const TIMEOUT_DEFAULT: Duration = Duration::from_secs(15);
/// Listing responses can be large.
pub const TIMEOUT_FILE_LIST: Duration = Duration::from_secs(30);
pub const TIMEOUT_UPLOAD_CHUNK: Duration = Duration::from_secs(30);
pub const TIMEOUT_DOWNLOAD: Duration = Duration::from_secs(30);
/// Trash, restore and multipart merge.
pub const TIMEOUT_TRASH: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Transfer sizes and pacing
// ---------------------------------------------------------------------------

/// Multipart upload part size (5 MiB).
pub const UPLOAD_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Streamed download write size (8 KiB).
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// Read block used while hashing (64 KiB).
pub const HASH_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Maximum entries per listing page.
pub const FILE_LIST_PAGE_LIMIT: u32 = 100;

/// Pages fetched back-to-back before the listing pauses.
pub const RATE_LIMIT_PAGES: u32 = 5;

/// Pause inserted every [`RATE_LIMIT_PAGES`] pages.
pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(10);

/// Wait after the multipart merge before confirming the upload.
pub const MERGE_DELAY: Duration = Duration::from_secs(1);

/// Suffix of in-flight download files.
pub const TEMP_SUFFIX: &str = "123pan";

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

pub const CODE_OK: i32 = 0;

/// Raw success code of the sign-in endpoint.
pub const CODE_LOGIN_OK: i32 = 200;

/// Server code for "a file with this name already exists".
pub const CODE_DUPLICATE_FILE: i32 = 5060;

/// Local advisory: the download destination already exists.
pub const CODE_CONFLICT: i32 = 1;

/// Transport failure (connect, timeout, DNS).
pub const CODE_TRANSPORT: i32 = -1;

/// Undecodable or malformed response envelope.
pub const CODE_DECODE: i32 = -2;

/// Server-reported business rejection.
pub const CODE_REJECTED: i32 = -3;

/// Local precondition violation or aggregated partial failure.
pub const CODE_FAILED: i32 = -1;
