use std::io::Read;
use std::path::Path;

use crate::{TransferError, UPLOAD_CHUNK_SIZE};

/// One contiguous slice of a file, numbered from 1.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub part_number: u32,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads a file in fixed-size chunks.
///
/// Every chunk except the last is exactly `chunk_size` bytes, so a file of
/// `S` bytes yields `ceil(S / chunk_size)` chunks.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: usize,
    next_part: u32,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    ///
    /// If `chunk_size` is 0, [`UPLOAD_CHUNK_SIZE`] (5 MiB) is used.
    pub fn new(path: &Path, chunk_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(TransferError::NotAFile(path.display().to_string()));
        }
        let chunk_size = if chunk_size == 0 {
            UPLOAD_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            file,
            chunk_size,
            next_part: 1,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = Chunk {
            part_number: self.next_part,
            data: buf,
        };
        self.next_part += 1;
        Ok(Some(chunk))
    }
}
