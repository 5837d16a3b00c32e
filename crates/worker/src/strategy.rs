//! Per-class fetch strategies with fallback chains.
//!
//! `execute` always resolves to a response: network failures fall back to
//! cached values, and the terminal fallback is the synthesized offline
//! response, never a propagated error. Callers detect the fully-offline case
//! by status, not by `Result`.

use std::sync::Arc;

use crate::classify::ResourceClass;
use crate::event::FetchEvent;
use umbra_client::{FetchResponse, Network, same_origin};
use umbra_core::cache::key::entry_key;
use umbra_core::{CacheDb, CacheEntry, StoreSet, StoredResponse};
use url::Url;

/// Runs one of three fetch strategies, selected by resource class.
pub struct StrategyExecutor {
    db: CacheDb,
    net: Arc<dyn Network>,
    stores: StoreSet,
    origin: Url,
    shell_path: String,
}

impl StrategyExecutor {
    pub fn new(db: CacheDb, net: Arc<dyn Network>, stores: StoreSet, origin: Url, shell_path: String) -> Self {
        Self { db, net, stores, origin, shell_path }
    }

    /// Run the strategy for `class` over one intercepted request.
    pub async fn execute(&self, class: ResourceClass, event: &FetchEvent) -> StoredResponse {
        match class {
            ResourceClass::Image => self.cache_first(self.stores.image(), event).await,
            ResourceClass::StaticAsset => self.cache_first(self.stores.runtime(), event).await,
            ResourceClass::Document => self.network_first_document(event).await,
            ResourceClass::Other => self.network_first_opportunistic(event).await,
        }
    }

    /// Assets and images are content-addressed by URL and effectively
    /// immutable per deploy: once cached, a hit never touches the network.
    async fn cache_first(&self, store: &str, event: &FetchEvent) -> StoredResponse {
        let key = event.cache_key();

        match self.db.match_entry(store, &key).await {
            Ok(Some(entry)) => {
                tracing::debug!("cache hit for {} in {}", event.url, store);
                return entry.into_response();
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("cache lookup failed for {}: {}", event.url, e),
        }

        match self.net.fetch(&event.url).await {
            Ok(response) => self.capture(store, event, &response).await,
            Err(e) => {
                tracing::warn!("fetch failed for {}: {}", event.url, e);
                // a concurrent handler may have filled the entry since the miss
                match self.db.match_entry(store, &key).await {
                    Ok(Some(entry)) => entry.into_response(),
                    _ => StoredResponse::offline(),
                }
            }
        }
    }

    /// Documents must reflect the latest deploy whenever the network is
    /// reachable; offline they degrade to the app shell rather than failing,
    /// so client-side routing keeps working.
    async fn network_first_document(&self, event: &FetchEvent) -> StoredResponse {
        match self.net.fetch(&event.url).await {
            Ok(response) => self.capture(self.stores.runtime(), event, &response).await,
            Err(e) => {
                tracing::warn!("navigation fetch failed for {}: {}", event.url, e);
                self.document_fallback(event).await
            }
        }
    }

    /// Fallback chain: app shell, then an exact match for the request,
    /// then the synthesized offline response.
    async fn document_fallback(&self, event: &FetchEvent) -> StoredResponse {
        if let Ok(shell_url) = self.origin.join(&self.shell_path) {
            let shell_key = entry_key("GET", shell_url.as_str());
            if let Ok(Some(entry)) = self.db.match_any(&shell_key).await {
                tracing::debug!("serving app shell for {}", event.url);
                return entry.into_response();
            }
        }

        match self.db.match_any(&event.cache_key()).await {
            Ok(Some(entry)) => entry.into_response(),
            _ => StoredResponse::offline(),
        }
    }

    /// Everything else races a cache lookup against the network. Same-origin
    /// successes are captured opportunistically; cross-origin responses are
    /// served but never persisted.
    async fn network_first_opportunistic(&self, event: &FetchEvent) -> StoredResponse {
        let key = event.cache_key();
        let (cached, fetched) =
            tokio::join!(self.db.match_entry(self.stores.runtime(), &key), self.net.fetch(&event.url));

        match fetched {
            Ok(response) => {
                if same_origin(&event.url, &self.origin) {
                    self.capture(self.stores.runtime(), event, &response).await
                } else {
                    response.to_stored()
                }
            }
            Err(e) => {
                tracing::warn!("fetch failed for {}: {}", event.url, e);
                match cached {
                    Ok(Some(entry)) => entry.into_response(),
                    _ => StoredResponse::offline(),
                }
            }
        }
    }

    /// Store a 2xx response and hand it back. Write failures are logged and
    /// the response is served regardless; redirects and error statuses are
    /// never written.
    async fn capture(&self, store: &str, event: &FetchEvent, response: &FetchResponse) -> StoredResponse {
        let stored = response.to_stored();
        if stored.is_ok() {
            let entry = CacheEntry::capture(&event.method, event.url.as_str(), &stored);
            if let Err(e) = self.db.put_entry(store, &entry).await {
                tracing::warn!("dropped cache write for {}: {}", event.url, e);
            }
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeNetwork, mem_db};

    const ORIGIN: &str = "https://app.example.com";

    struct Rig {
        exec: StrategyExecutor,
        db: CacheDb,
        net: Arc<FakeNetwork>,
    }

    async fn rig() -> Rig {
        let db = mem_db().await;
        let net = Arc::new(FakeNetwork::new());
        let exec = StrategyExecutor::new(
            db.clone(),
            Arc::clone(&net) as Arc<dyn Network>,
            StoreSet::new("v2"),
            Url::parse(ORIGIN).unwrap(),
            "/index.html".to_string(),
        );
        Rig { exec, db, net }
    }

    fn get(url: &str) -> FetchEvent {
        FetchEvent::get(Url::parse(url).unwrap())
    }

    fn nav(url: &str) -> FetchEvent {
        FetchEvent::navigation(Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_cache_first_miss_fetches_and_captures() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/logo.png", 200, "image/png", b"png-bytes");

        let event = get("https://app.example.com/logo.png");
        let response = rig.exec.execute(ResourceClass::Image, &event).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"png-bytes");
        assert!(rig.db.match_entry("image", &event.cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_first_hit_skips_network() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/main.js", 200, "application/javascript", b"let x = 1;");

        let event = get("https://app.example.com/main.js");
        let first = rig.exec.execute(ResourceClass::StaticAsset, &event).await;
        let second = rig.exec.execute(ResourceClass::StaticAsset, &event).await;

        assert_eq!(rig.net.calls_for("https://app.example.com/main.js"), 1);
        assert_eq!(first.body, second.body);
        assert_eq!(second.body, b"let x = 1;");
    }

    #[tokio::test]
    async fn test_cache_first_offline_and_uncached_synthesizes_503() {
        let rig = rig().await;
        rig.net.set_offline(true);

        let response = rig.exec.execute(ResourceClass::Image, &get("https://app.example.com/logo.png")).await;

        assert_eq!(response.status, 503);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_error_status_not_captured() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/gone.css", 404, "text/plain", b"not found");

        let event = get("https://app.example.com/gone.css");
        let response = rig.exec.execute(ResourceClass::StaticAsset, &event).await;

        assert_eq!(response.status, 404);
        assert!(rig.db.match_entry("runtime", &event.cache_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_document_success_captured_in_runtime() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/inbox", 200, "text/html", b"<html>inbox</html>");

        let event = nav("https://app.example.com/inbox");
        let response = rig.exec.execute(ResourceClass::Document, &event).await;

        assert_eq!(response.status, 200);
        assert!(rig.db.match_entry("runtime", &event.cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_document_offline_falls_back_to_shell() {
        let rig = rig().await;

        let shell = StoredResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            headers: Vec::new(),
            body: b"<html>shell</html>".to_vec(),
        };
        let shell_entry = CacheEntry::capture("GET", "https://app.example.com/index.html", &shell);
        rig.db.put_entry("runtime", &shell_entry).await.unwrap();

        rig.net.set_offline(true);
        let response = rig.exec.execute(ResourceClass::Document, &nav("https://app.example.com/inbox/42")).await;

        assert_eq!(response.body, b"<html>shell</html>");
    }

    #[tokio::test]
    async fn test_document_offline_shell_from_precache_store() {
        let rig = rig().await;

        let shell = StoredResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            headers: Vec::new(),
            body: b"<html>precached shell</html>".to_vec(),
        };
        let shell_entry = CacheEntry::capture("GET", "https://app.example.com/index.html", &shell);
        rig.db.put_entry("precache-v2", &shell_entry).await.unwrap();

        rig.net.set_offline(true);
        let response = rig.exec.execute(ResourceClass::Document, &nav("https://app.example.com/anywhere")).await;

        assert_eq!(response.body, b"<html>precached shell</html>");
    }

    #[tokio::test]
    async fn test_document_offline_exact_match_when_no_shell() {
        let rig = rig().await;

        let page = StoredResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            headers: Vec::new(),
            body: b"<html>report</html>".to_vec(),
        };
        let event = nav("https://app.example.com/reports/7");
        let entry = CacheEntry::capture("GET", event.url.as_str(), &page);
        rig.db.put_entry("runtime", &entry).await.unwrap();

        rig.net.set_offline(true);
        let response = rig.exec.execute(ResourceClass::Document, &event).await;

        assert_eq!(response.body, b"<html>report</html>");
    }

    #[tokio::test]
    async fn test_document_offline_total_miss_synthesizes_503() {
        let rig = rig().await;
        rig.net.set_offline(true);

        let response = rig.exec.execute(ResourceClass::Document, &nav("https://app.example.com/inbox")).await;

        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn test_opportunistic_same_origin_captured() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/api/records", 200, "application/json", b"[]");

        let event = get("https://app.example.com/api/records");
        let response = rig.exec.execute(ResourceClass::Other, &event).await;

        assert_eq!(response.status, 200);
        assert!(rig.db.match_entry("runtime", &event.cache_key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_opportunistic_cross_origin_never_persisted() {
        let rig = rig().await;
        rig.net.serve("https://cdn.example.net/lib.js", 200, "application/javascript", b"lib");

        let event = get("https://cdn.example.net/lib.js");
        let response = rig.exec.execute(ResourceClass::Other, &event).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"lib");
        assert!(rig.db.match_entry("runtime", &event.cache_key()).await.unwrap().is_none());
        assert_eq!(rig.db.usage().await.unwrap().total_bytes, 0);
    }

    #[tokio::test]
    async fn test_opportunistic_offline_serves_cached() {
        let rig = rig().await;
        rig.net.serve("https://app.example.com/api/records", 200, "application/json", b"[1,2]");

        let event = get("https://app.example.com/api/records");
        rig.exec.execute(ResourceClass::Other, &event).await;

        rig.net.set_offline(true);
        let response = rig.exec.execute(ResourceClass::Other, &event).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"[1,2]");
    }

    #[tokio::test]
    async fn test_opportunistic_offline_and_uncached_synthesizes_503() {
        let rig = rig().await;
        rig.net.set_offline(true);

        let response = rig.exec.execute(ResourceClass::Other, &get("https://cdn.example.net/lib.js")).await;

        assert_eq!(response.status, 503);
    }
}
