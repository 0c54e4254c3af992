//! Tests for observability sinks wired into towers

use std::sync::Arc;
use std::time::Duration;

use airport_tower::core::{
    operator_id, share_sink, spawn_operator, submit_with_backoff, BroadcastSink, ConcurrentTower,
    InMemoryEventSink, RequestKind, Tower, TowerAction,
};

#[test]
fn test_submission_and_saturation_are_recorded() {
    let log = InMemoryEventSink::new(16);
    let tower = ConcurrentTower::with_sink(1, 1, 1, share_sink(log.clone()));
    tower.register("A");
    tower.register("B");

    tower.submit("A", RequestKind::Landing).unwrap();
    assert!(tower.submit("B", RequestKind::Landing).is_err());

    assert_eq!(log.actions_for("A"), [TowerAction::Submitted]);
    assert_eq!(log.actions_for("B"), [TowerAction::Saturated]);
}

#[test]
fn test_operator_identity_is_recorded() {
    let log = InMemoryEventSink::new(16);
    let tower = ConcurrentTower::with_sink(1, 1, 4, share_sink(log.clone()));
    tower.register("A");
    tower.submit("A", RequestKind::Landing).unwrap();
    let request = tower.next_request().unwrap();
    tower.process(request, "OP-003");

    let assigned = log
        .events()
        .into_iter()
        .find(|e| e.action == TowerAction::Assigned)
        .unwrap();
    assert_eq!(assigned.operator.as_deref(), Some("OP-003"));
    assert_eq!(assigned.runway.as_deref(), Some("RWY-1"));
    assert_eq!(assigned.gate.as_deref(), Some("GATE-1"));
}

#[test]
fn test_broadcast_subscriber_sees_decisions() {
    let broadcast = BroadcastSink::new();
    let feed = broadcast.subscribe();
    let tower = ConcurrentTower::with_sink(1, 1, 4, share_sink(broadcast.clone()));
    tower.register("A");
    tower.submit("A", RequestKind::Takeoff).unwrap();
    let request = tower.next_request().unwrap();
    tower.process(request, "OP-001");

    let first = feed.recv_timeout(Duration::from_secs(1)).unwrap();
    let second = feed.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first.action, TowerAction::Submitted);
    assert_eq!(second.action, TowerAction::Assigned);
    assert_eq!(broadcast.subscriber_count(), 1);
}

#[test]
fn test_submission_precedes_decision_with_live_operators() {
    let log = InMemoryEventSink::new(100_000);
    let tower = Arc::new(ConcurrentTower::with_sink(2, 2, 2, share_sink(log.clone())));
    let operators: Vec<_> = (1..=3)
        .map(|n| spawn_operator(Arc::clone(&tower), operator_id(n)).unwrap())
        .collect();

    let ids: Vec<String> = (1..=24).map(|n| format!("IBE-{n:03}")).collect();
    for id in &ids {
        tower.register(id);
    }
    for id in &ids {
        submit_with_backoff(tower.as_ref(), id, RequestKind::Landing, Duration::from_millis(1))
            .unwrap();
    }
    tower.close();
    for op in operators {
        op.join().unwrap();
    }

    for id in &ids {
        let decided: Vec<_> = log
            .actions_for(id)
            .into_iter()
            .filter(|a| *a != TowerAction::Saturated)
            .collect();
        assert_eq!(decided[0], TowerAction::Submitted, "{id}: {decided:?}");
        assert!(matches!(
            decided[1],
            TowerAction::Assigned | TowerAction::Deferred
        ));
    }
}
