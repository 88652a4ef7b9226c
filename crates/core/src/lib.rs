//! Core types and shared functionality for favcache.
//!
//! This crate provides:
//! - File cache store with keyed, sharded layout
//! - Unified error types
//! - Configuration structures
//! - Image sniffing and response header construction

pub mod cache;
pub mod config;
pub mod error;
pub mod headers;
pub mod sniff;

pub use cache::{CacheStore, fingerprint};
pub use config::AppConfig;
pub use error::Error;
pub use headers::IconHeaders;
pub use sniff::IconFormat;
