use outpost_types::TaskId;
use std::str::FromStr;

// ── TaskId ───────────────────────────────────────────────────────

#[test]
fn task_ids_are_unique() {
    let a = TaskId::new();
    let b = TaskId::new();
    assert_ne!(a, b);
}

#[test]
fn task_id_display_parse_roundtrip() {
    let id = TaskId::new();
    let parsed = TaskId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn task_id_from_str() {
    let id = TaskId::new();
    let parsed = TaskId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn task_id_rejects_garbage() {
    assert!(TaskId::parse("not-a-uuid").is_err());
}

#[test]
fn task_id_serde_transparent() {
    let id = TaskId::new();
    let json = serde_json::to_string(&id).unwrap();
    // Serializes as a bare UUID string, not an object.
    assert_eq!(json, format!("\"{id}\""));
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn task_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = TaskId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}
