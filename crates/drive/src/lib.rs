//! Transfer engines for 123pan.
//!
//! [`Drive`] borrows a [`Client`] and runs the multi-request flows on top of
//! it: deduplicating multipart upload, direct-link resolution, atomic
//! streamed download and recursive folder download.

pub mod directory;
pub mod download;
pub mod error;
pub mod upload;

#[cfg(test)]
mod testing;

use pan123_client::Client;

pub use download::DownloadOutcome;
pub use error::DriveError;
pub use upload::UploadOutcome;

/// Transfer operations bound to one client session.
pub struct Drive<'a> {
    client: &'a Client,
}

impl<'a> Drive<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &'a Client {
        self.client
    }
}
