//! Test doubles shared by the module tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header::HeaderMap};
use umbra_client::{FetchResponse, Network};
use umbra_core::{CacheDb, Error};
use url::Url;

use crate::lifecycle::ClientControl;

pub async fn mem_db() -> CacheDb {
    CacheDb::open_in_memory().await.unwrap()
}

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// A scripted network: serves registered URLs, fails the rest, and records
/// every call so tests can assert on fetch counts.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Route>>,
    failures: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<HashMap<String, usize>>,
    uncached_calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, status: u16, content_type: &str, body: &[u8]) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Route { status, content_type: Some(content_type.to_string()), body: body.to_vec() },
        );
    }

    /// Make one URL fail even while the rest of the network is up.
    pub fn fail(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn uncached_calls(&self) -> usize {
        self.uncached_calls.load(Ordering::SeqCst)
    }

    fn respond(&self, url: &Url) -> Result<FetchResponse, Error> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        if self.offline.load(Ordering::SeqCst) || self.failures.lock().unwrap().contains(url.as_str()) {
            return Err(Error::Network(format!("simulated failure for {url}")));
        }

        let route = self
            .routes
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("no route to {url}")))?;

        Ok(FetchResponse {
            url: url.clone(),
            final_url: url.clone(),
            status: StatusCode::from_u16(route.status).unwrap(),
            content_type: route.content_type,
            bytes: Bytes::from(route.body),
            headers: HeaderMap::new(),
            fetch_ms: 1,
        })
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.respond(url)
    }

    async fn fetch_uncached(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.uncached_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(url)
    }
}

/// Records whether the engine claimed clients at activation.
#[derive(Default)]
pub struct RecordingClients {
    claims: AtomicUsize,
}

impl RecordingClients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientControl for RecordingClients {
    async fn claim(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
    }
}
