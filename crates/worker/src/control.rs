//! Out-of-band control messages from the owning application.
//!
//! Messages arrive tagged (`{"type": "ForceActivate"}`,
//! `{"type": "QuerySize"}`) and are independent of the intercepted request
//! stream. The size query is an O(total entries) scan; callers treat it as a
//! background query, not something for a hot path.

use serde::{Deserialize, Serialize};
use umbra_core::CacheUsage;

/// Message protocol accepted from the owning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Skip the waiting period and activate immediately.
    ForceActivate,
    /// Report aggregate cache usage over a reply channel.
    QuerySize,
}

/// Reply to a control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlReply {
    /// Forced activation ran; no payload.
    Activated,
    /// Aggregate usage for `QuerySize`.
    Size(CacheUsage),
}
