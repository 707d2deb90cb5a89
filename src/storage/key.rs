use sha1::{Digest, Sha1};
use std::fmt;

/// SHA-1 digest of a URL string, the primary key of a snapshot
///
/// The digest is taken over the exact bytes of the URL; `http://a.example`
/// and `http://a.example/` are different keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotKey([u8; 20]);

impl SnapshotKey {
    pub fn from_url(url: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(url.as_bytes());
        let mut digest = [0u8; 20];
        digest.copy_from_slice(&hasher.finalize());
        Self(digest)
    }

    /// Rebuilds a key from stored bytes; `None` unless exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotKey({})", self.to_hex())
    }
}
