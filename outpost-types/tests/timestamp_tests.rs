use outpost_types::UnixMillis;

// ── Construction and accessors ───────────────────────────────────

#[test]
fn from_millis_roundtrip() {
    let ts = UnixMillis::from_millis(1_700_000_000_000);
    assert_eq!(ts.as_millis(), 1_700_000_000_000);
}

#[test]
fn now_is_after_epoch() {
    assert!(UnixMillis::now().as_millis() > 0);
}

#[test]
fn now_is_monotonic_enough() {
    let a = UnixMillis::now();
    let b = UnixMillis::now();
    assert!(b >= a);
}

// ── Ordering and arithmetic ──────────────────────────────────────

#[test]
fn ordering_follows_millis() {
    let earlier = UnixMillis::from_millis(100);
    let later = UnixMillis::from_millis(200);
    assert!(earlier < later);
    assert_eq!(later.millis_since(earlier), 100);
}

#[test]
fn millis_since_saturates_at_zero() {
    let earlier = UnixMillis::from_millis(100);
    let later = UnixMillis::from_millis(200);
    assert_eq!(earlier.millis_since(later), 0);
}

#[test]
fn saturating_add_caps_at_max() {
    let ts = UnixMillis::from_millis(u64::MAX);
    assert_eq!(ts.saturating_add(10).as_millis(), u64::MAX);
}

// ── Serde ────────────────────────────────────────────────────────

#[test]
fn serializes_as_bare_number() {
    let ts = UnixMillis::from_millis(42);
    assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    let back: UnixMillis = serde_json::from_str("42").unwrap();
    assert_eq!(ts, back);
}
