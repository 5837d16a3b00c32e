//! Install/activate lifecycle for the cache worker.
//!
//! The worker moves through `Installing -> Waiting -> Active`. Installation
//! precaches the asset manifest; activation garbage-collects stores left
//! behind by prior deploys and takes over any already-open clients.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use umbra_client::Network;
use umbra_core::{CacheDb, CacheEntry, Error, StoreSet};
use url::Url;

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Precaching the manifest; not yet serving.
    Installing,
    /// Installed, waiting to take over from a previous version.
    Waiting,
    /// Controlling clients and intercepting requests.
    Active,
}

impl Phase {
    /// Only an active worker intercepts fetches.
    pub fn can_intercept(&self) -> bool {
        matches!(self, Phase::Active)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Installing => write!(f, "installing"),
            Phase::Waiting => write!(f, "waiting"),
            Phase::Active => write!(f, "active"),
        }
    }
}

/// Host-side handle to the clients (open pages) this worker can control.
///
/// Called once at activation so already-loaded clients are served by the new
/// version immediately instead of waiting for their next load.
#[async_trait]
pub trait ClientControl: Send + Sync {
    async fn claim(&self);
}

/// No-op handle for hosts without controllable clients.
pub struct DetachedClients;

#[async_trait]
impl ClientControl for DetachedClients {
    async fn claim(&self) {}
}

/// Outcome of the install-time precache pass.
///
/// A partial precache is acceptable: failed URLs are logged and skipped,
/// and installation completes regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallReport {
    pub fetched: usize,
    pub failed: usize,
}

/// Drives the install/activate protocol.
pub struct LifecycleController {
    db: CacheDb,
    net: Arc<dyn Network>,
    clients: Arc<dyn ClientControl>,
    stores: StoreSet,
    origin: Url,
    precache_paths: Vec<String>,
    phase: RwLock<Phase>,
}

impl LifecycleController {
    pub fn new(
        db: CacheDb, net: Arc<dyn Network>, clients: Arc<dyn ClientControl>, stores: StoreSet, origin: Url,
        precache_paths: Vec<String>,
    ) -> Self {
        Self { db, net, clients, stores, origin, precache_paths, phase: RwLock::new(Phase::Installing) }
    }

    pub async fn phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// Precache the manifest into this build's precache store.
    ///
    /// Each URL is fetched with cache-bypassing headers so a fresh deploy
    /// never precaches a stale copy of its own shell. Per-URL failures are
    /// logged and skipped; the worker always ends up Waiting.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let store = self.stores.precache();
        self.db.open_store(store).await?;

        let mut report = InstallReport { fetched: 0, failed: 0 };

        for path in &self.precache_paths {
            let url = match self.origin.join(path) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("skipping unresolvable precache path {path}: {e}");
                    report.failed += 1;
                    continue;
                }
            };

            match self.net.fetch_uncached(&url).await {
                Ok(response) if response.is_ok() => {
                    let entry = CacheEntry::capture("GET", url.as_str(), &response.to_stored());
                    match self.db.put_entry(store, &entry).await {
                        Ok(()) => report.fetched += 1,
                        Err(e) => {
                            tracing::warn!("failed to precache {url}: {e}");
                            report.failed += 1;
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!("precache fetch for {url} returned status {}", response.status);
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("precache fetch for {url} failed: {e}");
                    report.failed += 1;
                }
            }
        }

        *self.phase.write().await = Phase::Waiting;
        tracing::info!(fetched = report.fetched, failed = report.failed, store, "install complete");

        Ok(report)
    }

    /// Garbage-collect stores from prior deploys, go active, and claim any
    /// open clients. Returns the number of stores deleted.
    pub async fn activate(&self) -> Result<u64, Error> {
        let mut deleted = 0u64;

        for name in self.db.list_store_names().await? {
            if self.stores.is_live(&name) {
                continue;
            }
            match self.db.delete_store(&name).await {
                Ok(true) => {
                    tracing::debug!("garbage-collected store {name}");
                    deleted += 1;
                }
                Ok(false) => {}
                Err(e) => tracing::warn!("failed to delete store {name}: {e}"),
            }
        }

        *self.phase.write().await = Phase::Active;
        self.clients.claim().await;
        tracing::info!(deleted, "worker activated");

        Ok(deleted)
    }

    /// Activate immediately, skipping the waiting period. An already-open
    /// client may briefly see a mismatched shell/asset pairing until it
    /// reloads; the owning application opts into that for faster rollout.
    pub async fn force_activate(&self) -> Result<u64, Error> {
        tracing::info!("forced activation requested");
        self.activate().await
    }
}
