use serde::{Deserialize, Serialize};

/// Whether a remote entry is a file or a folder. Encoded as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EntryKind {
    File,
    Folder,
}

impl TryFrom<u8> for EntryKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::File),
            1 => Ok(Self::Folder),
            other => Err(format!("unknown entry type {other}")),
        }
    }
}

impl From<EntryKind> for u8 {
    fn from(kind: EntryKind) -> u8 {
        match kind {
            EntryKind::File => 0,
            EntryKind::Folder => 1,
        }
    }
}

/// Snapshot of one file or folder as returned by a listing call.
///
/// Entries are never mutated locally; any change is a server round-trip
/// followed by a fresh listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    #[serde(rename = "FileId")]
    pub id: i64,
    #[serde(rename = "FileName")]
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    #[serde(rename = "Size", default)]
    pub size: u64,
    /// Content hash (etag). Empty for folders.
    #[serde(rename = "Etag", default)]
    pub content_tag: String,
    /// Opaque storage routing token. Empty for folders.
    #[serde(rename = "S3KeyFlag", default)]
    pub storage_key_flag: String,
}

impl RemoteEntry {
    /// Builds a folder entry (size 0, no content tag).
    pub fn folder(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: EntryKind::Folder,
            size: 0,
            content_tag: String::new(),
            storage_key_flag: String::new(),
        }
    }

    /// Builds a file entry.
    pub fn file(
        id: i64,
        name: impl Into<String>,
        size: u64,
        content_tag: impl Into<String>,
        storage_key_flag: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: EntryKind::File,
            size,
            content_tag: content_tag.into(),
            storage_key_flag: storage_key_flag.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// What the server should do when an upload's name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum DuplicatePolicy {
    /// Report the collision and transfer nothing.
    #[default]
    Reject,
    Overwrite,
    KeepBoth,
}

impl From<DuplicatePolicy> for u8 {
    fn from(p: DuplicatePolicy) -> u8 {
        match p {
            DuplicatePolicy::Reject => 0,
            DuplicatePolicy::Overwrite => 1,
            DuplicatePolicy::KeepBoth => 2,
        }
    }
}

/// What a download does when the destination file already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingFilePolicy {
    /// Leave the file alone and report an advisory conflict.
    #[default]
    Conflict,
    /// Remove the existing file and download again.
    Overwrite,
    /// Leave the file alone and report success.
    Skip,
}

/// Account summary from the user info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(rename = "UID", default)]
    pub uid: i64,
    #[serde(rename = "Nickname", default)]
    pub nickname: String,
    #[serde(rename = "SpaceUsed", default)]
    pub space_used: u64,
    #[serde(rename = "SpacePermanent", default)]
    pub space_permanent: u64,
    #[serde(rename = "FileCount", default)]
    pub file_count: u64,
}
