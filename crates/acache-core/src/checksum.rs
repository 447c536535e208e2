//! Content hashes used as cache keys and for post-download verification.
//!
//! Files are hashed in chunks so large assets keep memory use bounded.

use anyhow::{Context, Result};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Digest used for content hashes. Asset manifests default to MD5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Hash a file and return the digest as lowercase hex.
    pub fn hash_path(self, path: &Path) -> Result<String> {
        match self {
            HashAlgorithm::Md5 => digest_path::<Md5>(path),
            HashAlgorithm::Sha256 => digest_path::<Sha256>(path),
        }
    }

    pub fn hash_bytes(self, data: &[u8]) -> String {
        match self {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => anyhow::bail!("unknown hash algorithm: {}", other),
        }
    }
}

fn digest_path<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = [0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
