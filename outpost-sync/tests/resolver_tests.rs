use outpost_sync::ConflictResolver;
use outpost_types::{ConflictOutcome, ConflictStrategy};
use serde_json::{json, Value};
use std::sync::Arc;

// ── Built-in strategies ──────────────────────────────────────────

#[tokio::test]
async fn client_wins_takes_client_copy() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(&json!({"v": 1}), &json!({"v": 2}), &ConflictStrategy::ClientWins)
        .await;
    assert_eq!(resolution.resolved_value["v"], 1);
    assert_eq!(resolution.outcome, ConflictOutcome::ClientApplied);
}

#[tokio::test]
async fn server_wins_takes_server_copy() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(&json!({"v": 1}), &json!({"v": 2}), &ConflictStrategy::ServerWins)
        .await;
    assert_eq!(resolution.resolved_value["v"], 2);
    assert_eq!(resolution.outcome, ConflictOutcome::ServerApplied);
}

#[tokio::test]
async fn resolution_is_deterministic() {
    let resolver = ConflictResolver::new();
    let client = json!({"v": 1});
    let server = json!({"v": 2});
    for _ in 0..10 {
        let a = resolver
            .resolve(&client, &server, &ConflictStrategy::ServerWins)
            .await;
        let b = resolver
            .resolve(&client, &server, &ConflictStrategy::ServerWins)
            .await;
        assert_eq!(a.resolved_value, b.resolved_value);
        assert_eq!(a.outcome, b.outcome);
    }
}

#[tokio::test]
async fn resolve_never_mutates_inputs() {
    let resolver = ConflictResolver::new();
    let client = json!({"v": 1, "nested": {"x": true}});
    let server = json!({"v": 2});
    let client_before = client.clone();
    let server_before = server.clone();

    resolver
        .resolve(&client, &server, &ConflictStrategy::FieldMerge)
        .await;

    assert_eq!(client, client_before);
    assert_eq!(server, server_before);
}

// ── Last-write-wins ──────────────────────────────────────────────

#[tokio::test]
async fn lww_newer_client_wins() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(
            &json!({"v": 1, "timestamp": 2000}),
            &json!({"v": 2, "timestamp": 1000}),
            &ConflictStrategy::LastWriteWins,
        )
        .await;
    assert_eq!(resolution.resolved_value["v"], 1);
    assert_eq!(resolution.outcome, ConflictOutcome::ClientApplied);
}

#[tokio::test]
async fn lww_newer_server_wins() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(
            &json!({"v": 1, "timestamp": 1000}),
            &json!({"v": 2, "timestamp": 2000}),
            &ConflictStrategy::LastWriteWins,
        )
        .await;
    assert_eq!(resolution.resolved_value["v"], 2);
}

#[tokio::test]
async fn lww_tie_prefers_server() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(
            &json!({"v": 1, "timestamp": 1000}),
            &json!({"v": 2, "timestamp": 1000}),
            &ConflictStrategy::LastWriteWins,
        )
        .await;
    assert_eq!(resolution.resolved_value["v"], 2);
    assert_eq!(resolution.outcome, ConflictOutcome::ServerApplied);
}

#[tokio::test]
async fn lww_missing_timestamps_prefer_server() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(&json!({"v": 1}), &json!({"v": 2}), &ConflictStrategy::LastWriteWins)
        .await;
    assert_eq!(resolution.resolved_value["v"], 2);
}

// ── Field merge ──────────────────────────────────────────────────

#[tokio::test]
async fn field_merge_keeps_client_only_fields() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(
            &json!({"a": 1, "b": 2}),
            &json!({"b": 20, "c": 30}),
            &ConflictStrategy::FieldMerge,
        )
        .await;
    assert_eq!(resolution.resolved_value, json!({"a": 1, "b": 20, "c": 30}));
    assert_eq!(resolution.outcome, ConflictOutcome::Merged);
}

#[tokio::test]
async fn field_merge_non_objects_fall_back_to_server() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(&json!([1, 2]), &json!({"v": 2}), &ConflictStrategy::FieldMerge)
        .await;
    assert_eq!(resolution.resolved_value, json!({"v": 2}));
    assert_eq!(resolution.outcome, ConflictOutcome::ServerApplied);
}

// ── Custom registry ──────────────────────────────────────────────

#[tokio::test]
async fn custom_resolver_dispatches_by_key() {
    let resolver = ConflictResolver::new();
    resolver
        .add_custom_resolver(
            "sum",
            Arc::new(|client: &Value, server: &Value| {
                let total = client["v"].as_i64().unwrap_or(0) + server["v"].as_i64().unwrap_or(0);
                json!({"v": total})
            }),
        )
        .await;

    let resolution = resolver
        .resolve(
            &json!({"v": 1}),
            &json!({"v": 2}),
            &ConflictStrategy::Custom("sum".to_string()),
        )
        .await;
    assert_eq!(resolution.resolved_value["v"], 3);
    assert_eq!(resolution.outcome, ConflictOutcome::Merged);
}

#[tokio::test]
async fn unknown_custom_key_rejects_instead_of_panicking() {
    let resolver = ConflictResolver::new();
    let resolution = resolver
        .resolve(
            &json!({"v": 1}),
            &json!({"v": 2}),
            &ConflictStrategy::Custom("missing".to_string()),
        )
        .await;
    assert_eq!(resolution.outcome, ConflictOutcome::Rejected);
    assert_eq!(resolution.resolved_value, Value::Null);
}

#[tokio::test]
async fn remove_custom_resolver_reports_presence() {
    let resolver = ConflictResolver::new();
    resolver
        .add_custom_resolver("noop", Arc::new(|c: &Value, _s: &Value| c.clone()))
        .await;

    assert!(resolver.remove_custom_resolver("noop").await);
    assert!(!resolver.remove_custom_resolver("noop").await);
}

// ── test_resolution ──────────────────────────────────────────────

#[tokio::test]
async fn test_resolution_matches_resolve() {
    let resolver = ConflictResolver::new();
    let client = json!({"v": 1});
    let server = json!({"v": 2});

    let preview = resolver
        .test_resolution(&client, &server, &ConflictStrategy::ClientWins)
        .await;
    let real = resolver
        .resolve(&client, &server, &ConflictStrategy::ClientWins)
        .await;
    assert_eq!(preview.resolved_value, real.resolved_value);
    assert_eq!(preview.outcome, real.outcome);
}
