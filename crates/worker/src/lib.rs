//! Offline-capable response cache engine.
//!
//! Sits between an application's network layer and the network itself,
//! intercepting GET requests, classifying them, and serving each class from
//! a purpose-specific cache store:
//!
//! - Documents go network-first and degrade to the app shell offline
//! - Same-origin assets and images go cache-first
//! - Everything else goes network-first with an opportunistic cache fallback
//!
//! The host wires [`CacheWorker`]'s `on_install` / `on_activate` /
//! `on_fetch` / `on_message` handlers into whatever event source it owns;
//! the engine itself is host-agnostic.

pub mod classify;
pub mod control;
pub mod engine;
pub mod event;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
mod testutil;

pub use classify::{ResourceClass, classify};
pub use control::{ControlMessage, ControlReply};
pub use engine::CacheWorker;
pub use event::FetchEvent;
pub use lifecycle::{ClientControl, DetachedClients, InstallReport, LifecycleController, Phase};
pub use strategy::StrategyExecutor;
