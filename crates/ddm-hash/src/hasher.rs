//! Streaming file digests.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ddm_types::{CancelToken, ContentId, HashAlgorithm};

use crate::error::{HashError, HashResult};

/// Read chunk size. Bounds memory per in-flight hash.
const CHUNK_SIZE: usize = 64 * 1024;

/// Computes content identities with a fixed algorithm.
///
/// Digest computation is pure: identical byte streams always produce
/// identical [`ContentId`]s. A size check against the walk-time
/// metadata catches files rewritten mid-read, though concurrent
/// mutation that preserves length can still slip through.
#[derive(Clone, Copy, Debug)]
pub struct FileHasher {
    algorithm: HashAlgorithm,
}

enum DigestState {
    Fast(crc32fast::Hasher),
    Strong(blake3::Hasher),
}

impl DigestState {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            DigestState::Fast(hasher) => hasher.update(bytes),
            DigestState::Strong(hasher) => {
                hasher.update(bytes);
            }
        }
    }

    fn finalize(self) -> ContentId {
        match self {
            DigestState::Fast(hasher) => ContentId::Fast(hasher.finalize()),
            DigestState::Strong(hasher) => ContentId::Strong(*hasher.finalize().as_bytes()),
        }
    }
}

impl FileHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this hasher applies.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest a file's bytes in bounded chunks.
    ///
    /// `expected_size` is the size recorded when the file was walked;
    /// a mismatch with the bytes actually read fails with
    /// [`HashError::SizeChanged`]. The cancel token is observed between
    /// chunks.
    pub fn digest_file(
        &self,
        path: &Path,
        expected_size: u64,
        cancel: &CancelToken,
    ) -> HashResult<ContentId> {
        let mut file = File::open(path)?;
        let mut state = match self.algorithm {
            HashAlgorithm::Fast => DigestState::Fast(crc32fast::Hasher::new()),
            HashAlgorithm::Strong => DigestState::Strong(blake3::Hasher::new()),
        };

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut total: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(HashError::Cancelled);
            }
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            state.update(&buf[..n]);
            total += n as u64;
        }

        if total != expected_size {
            return Err(HashError::SizeChanged {
                expected: expected_size,
                actual: total,
            });
        }
        Ok(state.finalize())
    }
}
