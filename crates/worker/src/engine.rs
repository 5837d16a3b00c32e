//! The cache worker facade wired by the host environment.
//!
//! The host owns transport and event delivery; the engine exposes the four
//! handlers it needs: `on_install`, `on_activate`, `on_fetch`, `on_message`.
//! Everything the engine touches (database, network, clients) is passed in
//! at construction, so it is independently constructible and testable.

use std::sync::Arc;

use crate::classify::classify;
use crate::control::{ControlMessage, ControlReply};
use crate::event::FetchEvent;
use crate::lifecycle::{ClientControl, InstallReport, LifecycleController, Phase};
use crate::strategy::StrategyExecutor;
use umbra_client::Network;
use umbra_core::{CacheDb, EngineConfig, Error, StoreSet, StoredResponse};
use url::Url;

/// The interception-and-caching engine.
pub struct CacheWorker {
    origin: Url,
    db: CacheDb,
    lifecycle: LifecycleController,
    strategies: StrategyExecutor,
}

impl CacheWorker {
    /// Construct from configuration, opening the backing database at
    /// `config.db_path`.
    pub async fn new(
        config: EngineConfig, net: Arc<dyn Network>, clients: Arc<dyn ClientControl>,
    ) -> Result<Self, Error> {
        let db = CacheDb::open(&config.db_path).await?;
        Self::with_db(config, db, net, clients)
    }

    /// Construct over an already-open database (in-memory databases, hosts
    /// that manage their own handle).
    pub fn with_db(
        config: EngineConfig, db: CacheDb, net: Arc<dyn Network>, clients: Arc<dyn ClientControl>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        let stores = StoreSet::new(&config.build_id);

        let lifecycle = LifecycleController::new(
            db.clone(),
            Arc::clone(&net),
            clients,
            stores.clone(),
            origin.clone(),
            config.precache_paths.clone(),
        );
        let strategies = StrategyExecutor::new(db.clone(), net, stores, origin.clone(), config.shell_path.clone());

        Ok(Self { origin, db, lifecycle, strategies })
    }

    /// Install-time hook: precache the manifest.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.install().await
    }

    /// Activate-time hook: garbage-collect stale stores and claim clients.
    /// Returns the number of stores deleted.
    pub async fn on_activate(&self) -> Result<u64, Error> {
        self.lifecycle.activate().await
    }

    /// Intercept one request.
    ///
    /// Returns None when the request is not handled (non-GET, or the worker
    /// has not activated yet) and the host should let it pass through to the
    /// network untouched. Otherwise always yields a response; the terminal
    /// fallback is a synthesized 503, never an error.
    pub async fn on_fetch(&self, event: &FetchEvent) -> Option<StoredResponse> {
        if !event.is_get() {
            return None;
        }
        if !self.lifecycle.phase().await.can_intercept() {
            return None;
        }

        let class = classify(event, &self.origin);
        tracing::debug!("intercepted {} as {:?}", event.url, class);
        Some(self.strategies.execute(class, event).await)
    }

    /// Handle one control message from the owning application.
    pub async fn on_message(&self, message: ControlMessage) -> Result<ControlReply, Error> {
        match message {
            ControlMessage::ForceActivate => {
                self.lifecycle.force_activate().await?;
                Ok(ControlReply::Activated)
            }
            ControlMessage::QuerySize => Ok(ControlReply::Size(self.db.usage().await?)),
        }
    }

    pub async fn phase(&self) -> Phase {
        self.lifecycle.phase().await
    }
}
