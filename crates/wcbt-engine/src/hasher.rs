//! Streaming content hash over files. SHA-256 by default; the algorithm
//! identifier travels with every manifest entry so a future migration to a
//! different algorithm stays explicit rather than implicit in file bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::manifest::HashAlgorithm;

const CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct HashResult {
    pub algorithm: HashAlgorithm,
    pub hex: String,
    pub size_bytes: u64,
}

/// Hashes `path` start-to-finish, reading in bounded chunks. I/O faults are
/// reported as `unreadable` rather than a generic I/O error, since that is
/// the distinction callers (journal/verify) need to make.
pub fn hash_file(path: &Path) -> Result<HashResult, WcbtError> {
    let mut file = File::open(path).map_err(|e| {
        WcbtError::with_source(ErrorKind::Unreadable, format!("cannot open {}", path.display()), e)
    })?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut size_bytes = 0u64;
    loop {
        let n = file.read(&mut buf).map_err(|e| {
            WcbtError::with_source(
                ErrorKind::Unreadable,
                format!("read failed for {}", path.display()),
                e,
            )
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size_bytes += n as u64;
    }

    Ok(HashResult {
        algorithm: HashAlgorithm::Sha256,
        hex: hex_encode(&hasher.finalize()),
        size_bytes,
    })
}

/// A streaming hasher for use while a file is being copied, so the copy and
/// the hash happen in the same pass over the bytes.
pub struct StreamingHasher {
    hasher: Sha256,
    size_bytes: u64,
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            size_bytes: 0,
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.size_bytes += chunk.len() as u64;
    }

    pub fn finalize(self) -> HashResult {
        HashResult {
            algorithm: HashAlgorithm::Sha256,
            hex: hex_encode(&self.hasher.finalize()),
            size_bytes: self.size_bytes,
        }
    }
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(&mut s, "{b:02x}").expect("writing to a String never fails");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn hashes_known_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello\n").unwrap();
        let result = hash_file(&path).unwrap();
        assert_eq!(result.size_bytes, 6);
        assert_eq!(
            result.hex,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn streaming_hasher_matches_hash_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello\n").unwrap();

        let mut streaming = StreamingHasher::new();
        streaming.update(b"hello\n");
        let streamed = streaming.finalize();

        let direct = hash_file(&path).unwrap();
        assert_eq!(streamed.hex, direct.hex);
        assert_eq!(streamed.size_bytes, direct.size_bytes);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let err = hash_file(&dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unreadable);
    }
}
