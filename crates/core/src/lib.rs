//! Core types and shared functionality for the umbra cache engine.
//!
//! This crate provides:
//! - The SQLite-backed cache store registry
//! - Store naming and per-deploy versioning
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, CacheUsage, StoreSet, StoredResponse};
pub use config::EngineConfig;
pub use error::Error;
