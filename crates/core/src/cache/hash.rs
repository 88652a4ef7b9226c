//! Keyed cache key derivation and content fingerprints.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::Error;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex characters of the keyed hash kept in file names.
pub const KEY_HASH_LEN: usize = 16;

/// Number of leading hash characters used as the shard directory.
pub const SHARD_LEN: usize = 2;

/// Derives unguessable, deterministic cache keys from host names.
#[derive(Clone)]
pub struct KeyDeriver {
    mac: HmacSha256,
}

impl std::fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDeriver").finish_non_exhaustive()
    }
}

impl KeyDeriver {
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::InvalidInput("cache secret key must not be empty".into()));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| Error::InvalidInput(format!("cache secret key rejected: {e}")))?;
        Ok(Self { mac })
    }

    /// Derive the cache key for `host`. Hosts are compared case-insensitively.
    pub fn derive(&self, host: &str) -> Result<CacheKey, Error> {
        let host = host.trim().to_lowercase();
        if host.is_empty() {
            return Err(Error::InvalidInput("cache host key must not be empty".into()));
        }

        let digest = self.mac.clone().chain_update(host.as_bytes()).finalize().into_bytes();
        let mut hash = hex::encode(digest);
        hash.truncate(KEY_HASH_LEN);

        Ok(CacheKey { host, hash })
    }
}

/// A derived cache key: the normalized host and its truncated keyed hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub host: String,
    pub hash: String,
}

impl CacheKey {
    pub fn shard(&self) -> &str {
        &self.hash[..SHARD_LEN]
    }

    /// `{host}_{hash}.dat`, with the host made safe for any filesystem.
    pub fn file_name(&self) -> String {
        format!("{}_{}.dat", file_safe(&self.host), self.hash)
    }

    /// Path of the entry relative to the cache root: `{shard}/{file_name}`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.shard()).join(self.file_name())
    }
}

fn file_safe(host: &str) -> String {
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Hex SHA-256 of `bytes`, used to recognize the placeholder icon.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
