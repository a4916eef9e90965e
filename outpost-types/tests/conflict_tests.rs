use outpost_types::{ConflictOutcome, ConflictResolution, ConflictStrategy, UnixMillis};
use serde_json::json;

// ── Strategy serde ───────────────────────────────────────────────

#[test]
fn builtin_strategy_wire_format() {
    assert_eq!(
        serde_json::to_value(ConflictStrategy::ClientWins).unwrap(),
        json!({"kind": "client-wins"})
    );
    assert_eq!(
        serde_json::to_value(ConflictStrategy::LastWriteWins).unwrap(),
        json!({"kind": "last-write-wins"})
    );
}

#[test]
fn custom_strategy_carries_key() {
    let strategy = ConflictStrategy::Custom("merge-cart".to_string());
    let value = serde_json::to_value(&strategy).unwrap();
    assert_eq!(value, json!({"kind": "custom", "key": "merge-cart"}));

    let back: ConflictStrategy = serde_json::from_value(value).unwrap();
    assert_eq!(back, strategy);
}

#[test]
fn default_strategy_is_server_wins() {
    assert_eq!(ConflictStrategy::default(), ConflictStrategy::ServerWins);
}

// ── Outcome serde ────────────────────────────────────────────────

#[test]
fn outcome_wire_names() {
    assert_eq!(
        serde_json::to_string(&ConflictOutcome::ClientApplied).unwrap(),
        "\"client-applied\""
    );
    assert_eq!(
        serde_json::to_string(&ConflictOutcome::Rejected).unwrap(),
        "\"rejected\""
    );
}

// ── Resolution record ────────────────────────────────────────────

#[test]
fn resolution_roundtrip() {
    let resolution = ConflictResolution {
        strategy_used: ConflictStrategy::FieldMerge,
        resolved_value: json!({"a": 1, "b": 2}),
        outcome: ConflictOutcome::Merged,
        timestamp: UnixMillis::from_millis(123),
    };
    let json = serde_json::to_string(&resolution).unwrap();
    let back: ConflictResolution = serde_json::from_str(&json).unwrap();
    assert_eq!(resolution, back);
}
