//! Icon cache policy: key lookup, source-aware TTL and lazy expiry.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::backend::{FsBackend, StorageBackend, StoredBlob};
use super::hash::{KeyDeriver, fingerprint};
use crate::Error;

/// TTL applied to placeholder entries, regardless of the configured TTL.
pub const PLACEHOLDER_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Sharded, keyed-hash file cache for resolved icons.
#[derive(Debug, Clone)]
pub struct CacheStore<B = FsBackend> {
    backend: B,
    keys: KeyDeriver,
}

impl CacheStore<FsBackend> {
    /// Open a cache rooted at `dir`. The directory is created on first write.
    pub fn open(dir: impl Into<PathBuf>, secret: &[u8]) -> Result<Self, Error> {
        Self::with_backend(FsBackend::new(dir), secret)
    }
}

impl<B: StorageBackend> CacheStore<B> {
    pub fn with_backend(backend: B, secret: &[u8]) -> Result<Self, Error> {
        Ok(Self { backend, keys: KeyDeriver::new(secret)? })
    }

    /// Return the cached bytes for `host`, or `None` on a miss.
    ///
    /// Entries matching `default_fingerprint` live for [`PLACEHOLDER_TTL`];
    /// everything else lives for `ttl`. Expired entries are deleted.
    pub fn get(&self, host: &str, default_fingerprint: &str, ttl: Duration) -> Result<Option<Vec<u8>>, Error> {
        self.get_at(host, default_fingerprint, ttl, SystemTime::now())
    }

    pub(crate) fn get_at(
        &self, host: &str, default_fingerprint: &str, ttl: Duration, now: SystemTime,
    ) -> Result<Option<Vec<u8>>, Error> {
        let rel = self.keys.derive(host)?.relative_path();
        let Some(blob) = self.read(&rel)? else {
            tracing::debug!(host, "cache miss");
            return Ok(None);
        };

        if blob.bytes.is_empty() {
            tracing::warn!(host, "empty cache entry discarded");
            self.remove(&rel)?;
            return Ok(None);
        }

        let effective = effective_ttl(&blob.bytes, default_fingerprint, ttl);
        let age = now.duration_since(blob.modified).unwrap_or(Duration::ZERO);

        if age > effective {
            tracing::debug!(host, age_secs = age.as_secs(), ttl_secs = effective.as_secs(), "cache entry expired");
            self.remove(&rel)?;
            return Ok(None);
        }

        tracing::debug!(host, bytes = blob.bytes.len(), "cache hit");
        Ok(Some(blob.bytes))
    }

    /// Store `bytes` for `host`, replacing any previous entry.
    pub fn set(&self, host: &str, bytes: &[u8]) -> Result<PathBuf, Error> {
        let rel = self.keys.derive(host)?.relative_path();
        let location = self.backend.locate(&rel);

        self.backend.write_locked(&rel, bytes).map_err(|e| {
            tracing::warn!(host, path = %location.display(), "cache write failed: {e}");
            Error::cache_io(location.display().to_string(), e)
        })?;

        tracing::debug!(host, bytes = bytes.len(), path = %location.display(), "cache entry written");
        Ok(location)
    }

    /// When the entry for `host` expires, or `None` if there is no entry.
    pub fn expiry_timestamp(
        &self, host: &str, default_fingerprint: &str, ttl: Duration,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        let rel = self.keys.derive(host)?.relative_path();
        let Some(blob) = self.read(&rel)?.filter(|blob| !blob.bytes.is_empty()) else {
            return Ok(None);
        };

        let expires = blob.modified + effective_ttl(&blob.bytes, default_fingerprint, ttl);
        Ok(Some(DateTime::<Utc>::from(expires)))
    }

    /// Delete the entry for `host`. Returns whether an entry existed.
    pub fn purge(&self, host: &str) -> Result<bool, Error> {
        let rel = self.keys.derive(host)?.relative_path();
        let existed = self.read(&rel)?.is_some();
        self.remove(&rel)?;
        Ok(existed)
    }

    /// Where the entry for `host` lives (or would live).
    pub fn path_for(&self, host: &str) -> Result<PathBuf, Error> {
        Ok(self.backend.locate(&self.keys.derive(host)?.relative_path()))
    }

    fn remove(&self, rel: &Path) -> Result<(), Error> {
        self.backend
            .remove(rel)
            .map_err(|e| Error::cache_io(self.backend.locate(rel).display().to_string(), e))
    }

    fn read(&self, rel: &Path) -> Result<Option<StoredBlob>, Error> {
        self.backend
            .read(rel)
            .map_err(|e| Error::cache_io(self.backend.locate(rel).display().to_string(), e))
    }
}

fn effective_ttl(bytes: &[u8], default_fingerprint: &str, ttl: Duration) -> Duration {
    if fingerprint(bytes).eq_ignore_ascii_case(default_fingerprint) { PLACEHOLDER_TTL } else { ttl }
}
