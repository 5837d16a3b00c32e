//! Request-derived cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a captured request.
///
/// Keys are derived from the method and the absolute URL (query included),
/// so two requests differing only in query string get distinct entries.
pub fn entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
