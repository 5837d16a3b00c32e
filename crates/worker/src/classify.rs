//! Resource classification for intercepted requests.
//!
//! Classification is a pure function of the request: no I/O, no state, and
//! calling it twice with an unmodified request yields the same class.

use crate::event::FetchEvent;
use umbra_client::same_origin;
use url::Url;

/// Policy bucket a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// A navigation or anything that accepts text/html.
    Document,
    /// Same-origin script/style/font/vector asset.
    StaticAsset,
    /// Same-origin raster image or icon.
    Image,
    /// Everything else, including all cross-origin requests.
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "ico"];
const ASSET_EXTENSIONS: &[&str] = &["js", "css", "svg", "woff", "woff2", "ttf", "eot"];

/// Classify a GET request against the engine's own origin.
///
/// The document check runs first and wins over the extension sets: freshness
/// matters more for documents than for content-addressed assets. Cross-origin
/// requests always classify `Other`, whatever their extension.
pub fn classify(event: &FetchEvent, own_origin: &Url) -> ResourceClass {
    if event.is_navigation || event.accept.as_deref().is_some_and(|a| a.contains("text/html")) {
        return ResourceClass::Document;
    }

    if !same_origin(&event.url, own_origin) {
        return ResourceClass::Other;
    }

    match path_extension(event.url.path()) {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::Image,
        Some(ext) if ASSET_EXTENSIONS.contains(&ext.as_str()) => ResourceClass::StaticAsset,
        _ => ResourceClass::Other,
    }
}

/// Lowercased extension of the final path segment, if it has one.
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
