use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::{HASH_READ_CHUNK_SIZE, TransferError};

/// MD5 of a whole file as lowercase hex.
///
/// Reads sequentially in 64 KiB blocks; the file is never held in memory.
/// Any read error discards the partial state.
pub fn digest_file(path: &Path) -> Result<String, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_READ_CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn digest_bytes(data: &[u8]) -> String {
        hex::encode(Md5::digest(data))
    }

    #[test]
    fn known_vectors() {
        assert_eq!(digest_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            digest_bytes(b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn file_digest_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        // Spans several read blocks with a ragged tail.
        let data: Vec<u8> = (0..(HASH_READ_CHUNK_SIZE * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        std::fs::File::create(&path).unwrap().write_all(&data).unwrap();

        assert_eq!(digest_file(&path).unwrap(), digest_bytes(&data));
    }

    #[test]
    fn file_digest_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"same content").unwrap();

        let first = digest_file(&path).unwrap();
        let second = digest_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = digest_file(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, TransferError::Io(_)));
    }
}
