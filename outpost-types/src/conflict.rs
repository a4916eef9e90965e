//! Conflict-resolution strategies and outcomes.
//!
//! When the remote service reports divergent state for a queued mutation,
//! the engine reduces the (client, server) value pair to one resolved
//! value using a named strategy. Strategies are pure: resolving never
//! mutates its inputs, and identical inputs always produce identical
//! output.

use crate::UnixMillis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named conflict-resolution strategy.
///
/// `Custom` dispatches to a resolver function registered on the engine
/// under the given key. An unregistered key degrades to a `Rejected`
/// outcome rather than failing the drain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "key")]
pub enum ConflictStrategy {
    /// The client copy wins unconditionally.
    ClientWins,
    /// The server copy wins unconditionally.
    ServerWins,
    /// Compare embedded `timestamp` fields; newer wins, server on tie.
    LastWriteWins,
    /// Shallow field merge; server fields win on key collision.
    FieldMerge,
    /// Dispatch to a registered resolver function.
    Custom(String),
}

impl Default for ConflictStrategy {
    /// Absent instructions the remote copy is authoritative.
    fn default() -> Self {
        Self::ServerWins
    }
}

/// How a conflict was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictOutcome {
    /// The client value was applied as-is.
    ClientApplied,
    /// The server value was applied as-is.
    ServerApplied,
    /// A merged or custom-resolved value was applied.
    Merged,
    /// No resolution was possible; manual intervention required.
    Rejected,
}

/// The record produced by resolving one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// The strategy that produced this resolution.
    pub strategy_used: ConflictStrategy,
    /// The resolved value (`null` when rejected).
    pub resolved_value: Value,
    /// How the conflict was settled.
    pub outcome: ConflictOutcome,
    /// When the resolution was computed.
    pub timestamp: UnixMillis,
}
