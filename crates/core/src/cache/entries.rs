//! Store and entry operations for the cache registry.
//!
//! A store is a named container of captured responses. Entries are keyed by
//! the request that produced them and overwritten wholesale on conflict;
//! there is no partial update, the last writer for a key wins.

use super::connection::CacheDb;
use super::key::entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response, as returned to the intercepting caller.
///
/// Bodies are owned byte buffers, so the same response can be both stored
/// and returned without consuming anything twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl StoredResponse {
    /// The synthesized terminal fallback: offline and nothing cached.
    ///
    /// Callers detect the fully-offline-and-uncached case by this status,
    /// never by a propagated error.
    pub fn offline() -> Self {
        Self { status: 503, content_type: None, headers: Vec::new(), body: Vec::new() }
    }

    /// Whether the response is cache-write eligible (2xx only; redirects
    /// and error statuses are never cached).
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single (request key -> response) row inside a cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Option<Vec<u8>>,
    pub fetched_at: String,
}

impl CacheEntry {
    /// Build an entry from a response captured for `method` + `url`.
    pub fn capture(method: &str, url: &str, response: &StoredResponse) -> Self {
        Self {
            key: entry_key(method, url),
            method: method.to_uppercase(),
            url: url.to_string(),
            status: response.status,
            content_type: response.content_type.clone(),
            headers_json: serde_json::to_string(&response.headers).ok(),
            body: Some(response.body.clone()),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Reconstruct the response this entry captured.
    pub fn into_response(self) -> StoredResponse {
        let headers = self
            .headers_json
            .and_then(|j| serde_json::from_str(&j).ok())
            .unwrap_or_default();
        StoredResponse {
            status: self.status,
            content_type: self.content_type,
            headers,
            body: self.body.unwrap_or_default(),
        }
    }
}

/// Aggregate cache usage, as reported to the owning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheUsage {
    pub total_bytes: u64,
    pub store_count: u64,
}

impl CacheDb {
    /// Open a store by name, creating it if absent. Idempotent.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write an entry into a store, overwriting any previous entry for the
    /// same key. The store is created on first write.
    ///
    /// # Errors
    ///
    /// Returns `Error::QuotaExceeded` when the underlying storage is full;
    /// callers must treat that as non-fatal and keep serving the response.
    pub async fn put_entry(&self, store: &str, entry: &CacheEntry) -> Result<(), Error> {
        let store = store.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, chrono::Utc::now().to_rfc3339()],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                        store, key, method, url, status, content_type,
                        headers_json, body, fetched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(store, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    params![
                        &store,
                        &entry.key,
                        &entry.method,
                        &entry.url,
                        entry.status,
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.fetched_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by key. Returns None on a cache miss.
    pub async fn match_entry(&self, store: &str, key: &str) -> Result<Option<CacheEntry>, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, content_type, headers_json, body, fetched_at
                     FROM entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        fetched_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by key across every store.
    ///
    /// When the same key was captured into several stores (the shell document
    /// lands in both the precache and runtime stores), the freshest capture
    /// wins.
    pub async fn match_any(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, content_type, headers_json, body, fetched_at
                     FROM entries WHERE key = ?1 ORDER BY fetched_at DESC LIMIT 1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        fetched_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// All store names currently present, including stale versions that have
    /// not been garbage-collected yet.
    pub async fn list_store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and, via cascade, every entry in it.
    ///
    /// Returns true if the store existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store.
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Sum body sizes across every store.
    ///
    /// Entries whose body cannot be sized (NULL bodies) are skipped rather
    /// than aborting the scan, so the total may undercount. Store count is
    /// the number of stores holding at least one entry.
    pub async fn usage(&self) -> Result<CacheUsage, Error> {
        self.conn
            .call(|conn| -> Result<CacheUsage, Error> {
                let (stores, bytes): (i64, i64) = conn.query_row(
                    "SELECT COUNT(DISTINCT store), COALESCE(SUM(LENGTH(body)), 0) FROM entries",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(CacheUsage { total_bytes: bytes as u64, store_count: stores as u64 })
            })
            .await
            .map_err(Error::from)
    }
}
