//! SQLite-backed registry of named cache stores.
//!
//! This module provides the persistent store registry behind the cache
//! engine, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named stores created lazily on first write
//! - Request-derived entry keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-store deletion for the activation garbage-collection pass

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod names;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, CacheUsage, StoredResponse};
pub use names::{IMAGE_STORE, RUNTIME_STORE, StoreSet};
