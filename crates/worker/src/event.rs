//! Intercepted request representation.

use umbra_core::cache::key::entry_key;
use url::Url;

/// One intercepted outbound request, as handed to the engine by the host.
///
/// The engine only handles GET; hosts pass other methods straight through,
/// and `CacheWorker::on_fetch` re-checks that before classifying.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub method: String,
    pub url: Url,
    /// Value of the request's Accept header, if any.
    pub accept: Option<String>,
    /// Whether the host flagged this request as a navigation.
    pub is_navigation: bool,
}

impl FetchEvent {
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_uppercase(), url, accept: None, is_navigation: false }
    }

    /// A plain GET subresource request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A top-level navigation request.
    pub fn navigation(url: Url) -> Self {
        Self { is_navigation: true, ..Self::get(url) }
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Key this request resolves to in a cache store.
    pub fn cache_key(&self) -> String {
        entry_key(&self.method, self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_method_normalized() {
        let event = FetchEvent::new("post", parse("https://example.com/api"));
        assert_eq!(event.method, "POST");
        assert!(!event.is_get());
    }

    #[test]
    fn test_navigation_flag() {
        let event = FetchEvent::navigation(parse("https://example.com/inbox"));
        assert!(event.is_navigation);
        assert!(event.is_get());
    }

    #[test]
    fn test_cache_key_matches_method_and_url() {
        let event = FetchEvent::get(parse("https://example.com/app.js"));
        assert_eq!(event.cache_key(), entry_key("GET", "https://example.com/app.js"));
    }
}
