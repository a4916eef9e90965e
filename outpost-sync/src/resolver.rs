//! Conflict resolution.
//!
//! Reduces a (client, server) value pair to one resolved value and an
//! outcome record using a named strategy. Built-in strategies are pure
//! functions; custom strategies dispatch through a typed registry of
//! `Fn(&Value, &Value) -> Value` keyed by string. Resolvers must not
//! capture mutable external state — the registry hands them shared
//! references only.

use outpost_types::{ConflictOutcome, ConflictResolution, ConflictStrategy, UnixMillis};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A registered custom resolver function.
pub type CustomResolverFn = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

/// Strategy registry and resolution entry point.
pub struct ConflictResolver {
    custom: RwLock<HashMap<String, CustomResolverFn>>,
    default_strategy: ConflictStrategy,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver {
    /// Creates a resolver with `server-wins` as the default strategy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(ConflictStrategy::default())
    }

    /// Creates a resolver with a specific default strategy, used when a
    /// task names none.
    #[must_use]
    pub fn with_default(default_strategy: ConflictStrategy) -> Self {
        Self {
            custom: RwLock::new(HashMap::new()),
            default_strategy,
        }
    }

    /// The strategy applied when a task names none.
    #[must_use]
    pub fn default_strategy(&self) -> &ConflictStrategy {
        &self.default_strategy
    }

    /// Registers a custom resolver under `key`, replacing any previous
    /// registration.
    pub async fn add_custom_resolver(&self, key: impl Into<String>, resolver: CustomResolverFn) {
        self.custom.write().await.insert(key.into(), resolver);
    }

    /// Removes a custom resolver. Returns `false` if the key was not
    /// registered.
    pub async fn remove_custom_resolver(&self, key: &str) -> bool {
        self.custom.write().await.remove(key).is_some()
    }

    /// Resolves a conflict. Never mutates its inputs; identical inputs
    /// produce identical resolutions (modulo the timestamp).
    pub async fn resolve(
        &self,
        client: &Value,
        server: &Value,
        strategy: &ConflictStrategy,
    ) -> ConflictResolution {
        let (resolved_value, outcome) = match strategy {
            ConflictStrategy::ClientWins => (client.clone(), ConflictOutcome::ClientApplied),
            ConflictStrategy::ServerWins => (server.clone(), ConflictOutcome::ServerApplied),
            ConflictStrategy::LastWriteWins => last_write_wins(client, server),
            ConflictStrategy::FieldMerge => field_merge(client, server),
            ConflictStrategy::Custom(key) => match self.custom.read().await.get(key) {
                Some(resolver) => (resolver(client, server), ConflictOutcome::Merged),
                None => {
                    warn!(key = %key, "unknown custom resolver, rejecting conflict");
                    (Value::Null, ConflictOutcome::Rejected)
                }
            },
        };

        debug!(?strategy, ?outcome, "conflict resolved");
        ConflictResolution {
            strategy_used: strategy.clone(),
            resolved_value,
            outcome,
            timestamp: UnixMillis::now(),
        }
    }

    /// Side-effect-free evaluation of a strategy against a value pair,
    /// usable for previews and tests. Touches neither the queue nor any
    /// persisted state.
    pub async fn test_resolution(
        &self,
        client: &Value,
        server: &Value,
        strategy: &ConflictStrategy,
    ) -> ConflictResolution {
        self.resolve(client, server, strategy).await
    }
}

/// Compares embedded `timestamp` fields; the newer value wins, the
/// server on tie or when either side lacks a timestamp the client needs
/// to beat.
fn last_write_wins(client: &Value, server: &Value) -> (Value, ConflictOutcome) {
    let client_ts = embedded_timestamp(client);
    let server_ts = embedded_timestamp(server);
    if client_ts > server_ts {
        (client.clone(), ConflictOutcome::ClientApplied)
    } else {
        (server.clone(), ConflictOutcome::ServerApplied)
    }
}

/// Shallow merge of two JSON objects; server fields win on key
/// collision. Non-object inputs fall back to the server copy.
fn field_merge(client: &Value, server: &Value) -> (Value, ConflictOutcome) {
    match (client.as_object(), server.as_object()) {
        (Some(client_map), Some(server_map)) => {
            let mut merged: Map<String, Value> = client_map.clone();
            for (key, value) in server_map {
                merged.insert(key.clone(), value.clone());
            }
            (Value::Object(merged), ConflictOutcome::Merged)
        }
        _ => (server.clone(), ConflictOutcome::ServerApplied),
    }
}

fn embedded_timestamp(value: &Value) -> u64 {
    value
        .get("timestamp")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
