use std::fmt;

use serde::{Deserialize, Serialize};

/// Which digest function stands in for content equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// CRC32. Cheap change detection; collisions can mask a change.
    Fast,
    /// BLAKE3. Cryptographic content identity.
    #[default]
    Strong,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Fast => write!(f, "fast"),
            HashAlgorithm::Strong => write!(f, "strong"),
        }
    }
}

/// A content identity: the digest of a file's byte stream.
///
/// Two files with equal `ContentId` are treated as content-equal
/// regardless of metadata. Digests from different algorithms never
/// compare equal, so one diff run must use a single algorithm
/// throughout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentId {
    Fast(u32),
    Strong([u8; 32]),
}

impl ContentId {
    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            ContentId::Fast(_) => HashAlgorithm::Fast,
            ContentId::Strong(_) => HashAlgorithm::Strong,
        }
    }

    /// Hex rendering of the digest bytes.
    pub fn to_hex(&self) -> String {
        match self {
            ContentId::Fast(crc) => hex::encode(crc.to_be_bytes()),
            ContentId::Strong(bytes) => hex::encode(bytes),
        }
    }

    /// Short hex rendering (first 8 characters).
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({}:{})", self.algorithm(), self.short_hex())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
