//! Exact-content digests.
//!
//! Files are streamed through the digest in 8 KiB chunks, so two files hash
//! equal only when they are byte-identical.

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read size for streaming digests
pub const CHUNK_SIZE: usize = 8192;

/// Digest algorithm used for exact-duplicate detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => write!(f, "sha256"),
            DigestAlgorithm::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Digest of a file's raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash {
    pub algorithm: DigestAlgorithm,
    pub digest: Vec<u8>,
}

impl ContentHash {
    /// 1.0 when both digests come from the same algorithm and are equal
    pub fn exact_match(&self, other: &ContentHash) -> f64 {
        if self == other {
            1.0
        } else {
            0.0
        }
    }

    pub fn to_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Streaming digest over file contents
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
    algorithm: DigestAlgorithm,
}

enum Streaming {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Streaming {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Streaming::Sha256(Sha256::new()),
            DigestAlgorithm::Blake3 => Streaming::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Streaming::Sha256(hasher) => hasher.update(chunk),
            Streaming::Blake3(hasher) => {
                hasher.update(chunk);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Streaming::Sha256(hasher) => hasher.finalize().to_vec(),
            Streaming::Blake3(hasher) => hasher.finalize().as_bytes().to_vec(),
        }
    }
}

impl ContentHasher {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Digest everything a reader yields, one chunk at a time
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentHash> {
        let mut state = Streaming::new(self.algorithm);
        let mut buffer = [0u8; CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..read]);
        }
        Ok(ContentHash {
            algorithm: self.algorithm,
            digest: state.finalize(),
        })
    }

    /// Digest a file on disk
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash, ExtractionError> {
        let file = File::open(path).map_err(|e| ExtractionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.hash_reader(file).map_err(|e| ExtractionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Digest bytes already in memory
    pub fn hash_bytes(&self, bytes: &[u8]) -> ContentHash {
        let mut state = Streaming::new(self.algorithm);
        for chunk in bytes.chunks(CHUNK_SIZE) {
            state.update(chunk);
        }
        ContentHash {
            algorithm: self.algorithm,
            digest: state.finalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn sha256_of_empty_input() {
        let hash = ContentHasher::new(DigestAlgorithm::Sha256).hash_bytes(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn blake3_digest_is_32_bytes() {
        let hash = ContentHasher::new(DigestAlgorithm::Blake3).hash_bytes(b"product.jpg");
        assert_eq!(hash.digest.len(), 32);
        assert_eq!(hash.algorithm, DigestAlgorithm::Blake3);
    }

    #[test]
    fn streaming_matches_in_memory_across_chunk_boundaries() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Blake3] {
            let hasher = ContentHasher::new(algorithm);
            assert_eq!(hasher.hash_file(file.path()).unwrap(), hasher.hash_bytes(&data));
        }
    }

    #[test]
    fn exact_match_is_reflexive_and_symmetric() {
        let hasher = ContentHasher::default();
        let a = hasher.hash_bytes(b"aaa");
        let b = hasher.hash_bytes(b"aab");

        assert_eq!(a.exact_match(&a), 1.0);
        assert_eq!(a.exact_match(&b), 0.0);
        assert_eq!(a.exact_match(&b), b.exact_match(&a));
    }

    #[test]
    fn different_algorithms_never_match() {
        let a = ContentHasher::new(DigestAlgorithm::Sha256).hash_bytes(b"x");
        let b = ContentHasher::new(DigestAlgorithm::Blake3).hash_bytes(b"x");
        assert_eq!(a.exact_match(&b), 0.0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = ContentHasher::default().hash_file(Path::new("/nonexistent/a.jpg"));
        assert!(matches!(result, Err(ExtractionError::IoError { .. })));
    }
}
