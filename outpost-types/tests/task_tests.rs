use outpost_types::{
    ConflictStrategy, HttpMethod, Priority, SyncTask, TaskDraft, TaskId, TaskKind, TaskStatus,
    UnixMillis,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Draft defaults ───────────────────────────────────────────────

#[test]
fn draft_defaults() {
    let draft = TaskDraft::new(TaskKind::Api, "https://example.com", HttpMethod::Post);
    assert_eq!(draft.priority, Priority::Medium);
    assert_eq!(draft.max_retries, 3);
    assert_eq!(draft.retry_delay_ms, 1_000);
    assert!(draft.headers.is_empty());
    assert!(draft.body.is_none());
    assert!(draft.conflict_strategy.is_none());
}

#[test]
fn api_constructor_defaults() {
    let draft = TaskDraft::api("https://example.com/things", HttpMethod::Put);
    assert_eq!(draft.kind, TaskKind::Api);
    assert_eq!(draft.method, HttpMethod::Put);
    assert_eq!(draft.priority, Priority::Medium);
}

#[test]
fn data_constructor_defaults_to_post() {
    let draft = TaskDraft::data("https://example.com/data");
    assert_eq!(draft.kind, TaskKind::Data);
    assert_eq!(draft.method, HttpMethod::Post);
}

#[test]
fn file_constructor_records_metadata() {
    let draft = TaskDraft::file("https://example.com/upload", "photo.jpg", 1024);
    assert_eq!(draft.kind, TaskKind::File);
    assert_eq!(draft.metadata["fileName"], json!("photo.jpg"));
    assert_eq!(draft.metadata["fileSize"], json!(1024));
}

#[test]
fn notification_constructor_is_low_priority() {
    let draft = TaskDraft::notification("https://example.com/notify");
    assert_eq!(draft.kind, TaskKind::Notification);
    assert_eq!(draft.priority, Priority::Low);
}

// ── Builder methods ──────────────────────────────────────────────

#[test]
fn builder_chain() {
    let draft = TaskDraft::data("https://example.com")
        .body(json!({"a": 1}))
        .header("x-request-id", "abc")
        .priority(Priority::High)
        .max_retries(5)
        .retry_delay_ms(250)
        .metadata("origin", json!("test"))
        .conflict_strategy(ConflictStrategy::ClientWins);

    assert_eq!(draft.body, Some(json!({"a": 1})));
    assert_eq!(draft.headers["x-request-id"], "abc");
    assert_eq!(draft.priority, Priority::High);
    assert_eq!(draft.max_retries, 5);
    assert_eq!(draft.retry_delay_ms, 250);
    assert_eq!(draft.metadata["origin"], json!("test"));
    assert_eq!(draft.conflict_strategy, Some(ConflictStrategy::ClientWins));
}

// ── into_task ────────────────────────────────────────────────────

#[test]
fn into_task_assigns_queue_fields() {
    let id = TaskId::new();
    let created = UnixMillis::from_millis(1_000);
    let task = TaskDraft::data("https://example.com").into_task(id, created);

    assert_eq!(task.id, id);
    assert_eq!(task.created_at, created);
    assert_eq!(task.retry_count, 0);
    assert_eq!(task.status, TaskStatus::Pending);
}

#[test]
fn expiry_is_relative_to_creation() {
    let task = TaskDraft::data("https://example.com")
        .into_task(TaskId::new(), UnixMillis::from_millis(1_000));

    assert!(!task.is_expired(UnixMillis::from_millis(1_500), 600));
    assert!(task.is_expired(UnixMillis::from_millis(2_000), 600));
}

// ── Priority ordering ────────────────────────────────────────────

#[test]
fn priority_rank_high_first() {
    assert!(Priority::High.rank() < Priority::Medium.rank());
    assert!(Priority::Medium.rank() < Priority::Low.rank());
}

#[test]
fn http_method_wire_strings() {
    assert_eq!(HttpMethod::Get.as_str(), "GET");
    assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn task_serde_roundtrip() {
    let task = TaskDraft::file("https://example.com/upload", "doc.pdf", 2048)
        .body(json!({"note": "hello"}))
        .header("authorization", "Bearer t")
        .conflict_strategy(ConflictStrategy::Custom("merge-cart".to_string()))
        .into_task(TaskId::new(), UnixMillis::now());

    let json = serde_json::to_string(&task).unwrap();
    let back: SyncTask = serde_json::from_str(&json).unwrap();
    assert_eq!(task, back);
}

#[test]
fn enum_wire_names() {
    assert_eq!(serde_json::to_string(&TaskKind::Api).unwrap(), "\"api\"");
    assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    assert_eq!(
        serde_json::to_string(&HttpMethod::Delete).unwrap(),
        "\"DELETE\""
    );
    assert_eq!(
        serde_json::to_string(&TaskStatus::DeadLettered).unwrap(),
        "\"dead-lettered\""
    );
}
