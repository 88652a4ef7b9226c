//! Sharded on-disk cache for resolved icons.
//!
//! Entries live at `{dir}/{hash[0:2]}/{host}_{hash}.dat`, where `hash` is a
//! truncated HMAC-SHA256 of the lower-cased host. This module provides:
//!
//! - Keyed key derivation so file names cannot be guessed without the secret
//! - Source-aware TTL (placeholder icons get a fixed extended lifetime)
//! - Lazy deletion of expired entries on read
//! - Exclusive-lock writes through a pluggable storage backend

pub mod backend;
pub mod hash;
pub mod store;

pub use crate::Error;

pub use backend::{FsBackend, StorageBackend, StoredBlob};
pub use hash::{CacheKey, KeyDeriver, fingerprint};
pub use store::{CacheStore, PLACEHOLDER_TTL};
