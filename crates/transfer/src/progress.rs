use std::time::Duration;

use tokio::time::Instant;

/// Progress notification emitted by the transfer engines.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// A part finished uploading.
    UploadProgress { uploaded: u64, total: u64 },
    /// A block was written during a streamed download.
    DownloadProgress {
        downloaded: u64,
        /// `0` when the server did not announce a length.
        total: u64,
        bytes_per_second: f64,
    },
    /// A directory download is about to fetch a file.
    DownloadStartFile { name: String, size: u64 },
    /// A directory download is about to descend into a sub-folder.
    DownloadStartDirectory { name: String },
}

impl TransferEvent {
    /// Completion percentage for byte-progress events with a known total.
    pub fn percent(&self) -> Option<f64> {
        let (done, total) = match self {
            Self::UploadProgress { uploaded, total } => (*uploaded, *total),
            Self::DownloadProgress {
                downloaded, total, ..
            } => (*downloaded, *total),
            _ => return None,
        };
        if total == 0 {
            return None;
        }
        Some(done as f64 / total as f64 * 100.0)
    }
}

/// Callback receiving transfer events.
pub type ProgressFn = dyn Fn(TransferEvent) + Send + Sync;

/// Invokes `progress` if one was supplied.
pub fn emit(progress: Option<&ProgressFn>, event: TransferEvent) {
    if let Some(cb) = progress {
        cb(event);
    }
}

/// Average rate since the transfer started.
///
/// Runs on the tokio clock, so paused-time tests see deterministic rates.
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    started: Instant,
}

impl Throughput {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Bytes per second over the elapsed time, `0.0` when no time has
    /// passed.
    pub fn bytes_per_second(&self, bytes: u64) -> f64 {
        Self::rate(bytes, self.started.elapsed())
    }

    pub fn rate(bytes: u64, elapsed: Duration) -> f64 {
        if elapsed.is_zero() {
            return 0.0;
        }
        bytes as f64 / elapsed.as_secs_f64()
    }
}
