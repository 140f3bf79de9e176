//! Drive error types.

use std::path::{Path, PathBuf};

use pan123_client::ApiError;
use pan123_protocol::Report;
use pan123_protocol::constants::CODE_FAILED;
use pan123_transfer::TransferError;

/// Errors produced by the transfer engines.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Precondition(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("cannot resolve direct link: {0}")]
    Resolve(String),

    /// Some children of a folder download failed. `path` was still created
    /// and holds whatever did land.
    #[error("some entries failed to download: {}", failures.join("; "))]
    Partial {
        path: PathBuf,
        failures: Vec<String>,
    },
}

impl DriveError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Api(e) => e.code(),
            _ => CODE_FAILED,
        }
    }

    /// Local folder a partially failed download was written to.
    pub fn created_path(&self) -> Option<&Path> {
        match self {
            Self::Partial { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl Report for DriveError {
    fn code(&self) -> i32 {
        DriveError::code(self)
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
