//! Network client for the umbra cache engine.
//!
//! This crate provides the outbound HTTP fetch layer and the `Network`
//! abstraction the engine consumes, so hosts and tests can substitute
//! their own transport.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Network, canonicalize, same_origin};
