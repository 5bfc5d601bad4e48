//! Artifact Record - content-addressed run outputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Artifact Record describes one file stored under a run.
///
/// ## CAS Hash Format
///
/// The `cas_hash` follows the format `sha256:<hex_digest>` and is computed
/// over the exact bytes written to `relative_path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactRecord {
    key: String,
    relative_path: PathBuf,
    cas_hash: String,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl ArtifactRecord {
    /// Describe `bytes` stored at `artifacts/<key>/<file_name>` within a run.
    #[must_use]
    pub fn for_bytes(key: impl Into<String>, file_name: &str, bytes: &[u8]) -> Self {
        let key = key.into();
        Self {
            relative_path: Path::new("artifacts").join(&key).join(file_name),
            key,
            cas_hash: cas_hash(bytes),
            size_bytes: bytes.len() as u64,
            created_at: Utc::now(),
        }
    }

    /// Get the artifact key/name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path of the artifact file relative to its run directory.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Get the content-addressable hash.
    #[must_use]
    pub fn cas_hash(&self) -> &str {
        &self.cas_hash
    }

    /// Get the artifact size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True if `bytes` hash to this record's `cas_hash`.
    #[must_use]
    pub fn matches(&self, bytes: &[u8]) -> bool {
        cas_hash(bytes) == self.cas_hash
    }
}

/// `sha256:<hex>` digest of `bytes`
#[must_use]
pub fn cas_hash(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}
