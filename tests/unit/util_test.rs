//! Tests for utility helpers

use std::fs;

use airport_tower::config::SimulationConfig;
use airport_tower::util::{init_logging, init_tracing, now_ms, run_timestamp};

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(a > 0);
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing("warn");
    init_tracing("debug");
}

#[test]
fn test_run_timestamp_shape() {
    let stamp = run_timestamp();
    assert_eq!(stamp.len(), 15);
    assert_eq!(stamp.as_bytes()[8], b'_');
    assert_eq!(stamp.chars().filter(char::is_ascii_digit).count(), 14);
}

#[test]
fn test_init_logging_creates_run_file() {
    let root = std::env::temp_dir().join(format!("airport-logs-{}", now_ms()));
    let mut cfg = SimulationConfig::default().with_aircraft(4).with_operators(2);
    cfg.log_dir = Some(root.clone());

    let stamp = run_timestamp();
    let path = cfg.log_path(&stamp).unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "stale").unwrap();

    let guard = init_logging("info", &path).unwrap();
    tracing::info!("tower online");
    drop(guard);

    assert!(path.starts_with(root.join("concurrent")));
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        format!("airport-CONCURRENT-4AV-3RWY-5GATE-2OP-{stamp}.log")
    );
    // Truncated on start; other tests may own the global subscriber.
    assert!(!fs::read_to_string(&path).unwrap().contains("stale"));

    fs::remove_dir_all(&root).unwrap();
}
