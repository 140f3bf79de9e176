//! Local side of 123pan transfers: content hashing, fixed-size chunk reads,
//! per-transfer bookkeeping and progress events.
//!
//! Nothing in this crate touches the network.

mod chunked;
mod format;
mod hash;
mod progress;
mod types;
mod validation;

pub use chunked::{Chunk, ChunkReader};
pub use format::format_size;
pub use hash::digest_file;
pub use progress::{ProgressFn, Throughput, TransferEvent, emit};
pub use types::{DownloadTarget, UploadSession};
pub use validation::validate_entry_name;

pub use pan123_protocol::constants::{HASH_READ_CHUNK_SIZE, UPLOAD_CHUNK_SIZE};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("not a regular file: {0}")]
    NotAFile(String),
}
