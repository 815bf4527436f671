//! Integration tests for the scan-to-login ticket lifecycle.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use qrlogin_auth::{
    ClaimOutcome, PollOutcome, TicketConfig, TicketId, TicketService, UserId,
    mocks::MockTicketBackend,
    stores::{JsonFileBackend, NoopBackend, TableTicketStore},
};
use qrlogin_core::environment::{Clock, SystemClock};
use qrlogin_core::id::SnowflakeIdGenerator;
use qrlogin_testing::{ManualClock, SequentialIdGenerator, init_test_tracing, test_clock};
use std::collections::HashSet;
use std::sync::Arc;

type MemoryService =
    TicketService<TableTicketStore<NoopBackend>, SequentialIdGenerator, ManualClock>;

/// Service with a 10 second TTL over an in-memory table.
fn create_test_service(prefix: &str) -> (MemoryService, ManualClock) {
    init_test_tracing();
    let clock = ManualClock::new(test_clock().now());
    let service = TicketService::new(
        TableTicketStore::in_memory(),
        SequentialIdGenerator::with_prefix(prefix),
        clock.clone(),
        TicketConfig::new("http://192.168.100.100:3000".to_string()).with_ttl_secs(10),
    );
    (service, clock)
}

#[tokio::test]
async fn test_claim_then_poll_scenario() {
    let (service, clock) = create_test_service("A");

    let issued = service.issue("10.0.0.7").await.unwrap();
    assert_eq!(issued.id, TicketId::from("A000001"));

    clock.advance_secs(1);
    assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotYet);

    clock.advance_secs(1);
    let claim = service.claim(&issued.id, &"user42".into()).await.unwrap();
    assert_eq!(claim, ClaimOutcome::Success);

    clock.advance_secs(1);
    let poll = service.poll(&issued.id).await.unwrap();
    assert_eq!(poll, PollOutcome::Success("user42".into()));
    assert_eq!(poll.message(), "success");

    clock.advance_secs(1);
    assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotFound);
}

#[tokio::test]
async fn test_expiry_scenario() {
    let (service, clock) = create_test_service("B");
    let issued = service.issue("10.0.0.7").await.unwrap();

    clock.advance_secs(11);
    let expired = service.poll(&issued.id).await.unwrap();
    assert_eq!(expired, PollOutcome::Expired);
    assert_eq!(expired.message(), "expired");

    clock.advance_secs(1);
    assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotFound);
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let (service, _) = create_test_service("C");

    assert_eq!(service.poll(&"missing".into()).await.unwrap(), PollOutcome::NotFound);
    assert_eq!(
        service.claim(&"missing".into(), &"u".into()).await.unwrap(),
        ClaimOutcome::NotFound
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_yields_unique_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickets.json");
    let ids = SnowflakeIdGenerator::new(7, Arc::new(SystemClock)).unwrap();
    let service = Arc::new(TicketService::new(
        TableTicketStore::open(JsonFileBackend::new(&path)).await,
        ids,
        SystemClock,
        TicketConfig::default(),
    ));

    let handles: Vec<_> = (0..100)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.issue(&format!("10.0.1.{i}")).await })
        })
        .collect();

    let mut issued = HashSet::new();
    for handle in handles {
        issued.insert(handle.await.unwrap().unwrap().id);
    }

    assert_eq!(issued.len(), 100, "Every ticket should get a distinct id");

    // Nothing lost to interleaved whole-table writes.
    let on_disk = JsonFileBackend::new(&path);
    let reopened = TableTicketStore::open(on_disk).await;
    assert_eq!(reopened.len().await, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_then_poll() {
    let (service, _) = create_test_service("D");
    let service = Arc::new(service);

    let issues: Vec<_> = (0..50)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.issue("10.0.0.7").await.unwrap().id })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in issues {
        ids.push(handle.await.unwrap());
    }

    let polls: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.poll(&id).await.unwrap() })
        })
        .collect();

    for handle in polls {
        assert_eq!(handle.await.unwrap(), PollOutcome::NotYet);
    }
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let (service, _) = create_test_service("E");
    let service = Arc::new(service);
    let issued = service.issue("10.0.0.7").await.unwrap();

    let claims: Vec<_> = (0..10)
        .map(|i| {
            let service = Arc::clone(&service);
            let id = issued.id.clone();
            let user = UserId::new(format!("user{i}"));
            tokio::spawn(async move { service.claim(&id, &user).await })
        })
        .collect();

    let mut winners = 0;
    for handle in claims {
        match handle.await.unwrap().unwrap() {
            ClaimOutcome::Success => winners += 1,
            ClaimOutcome::AlreadyClaimed => {}
            other => panic!("Unexpected claim outcome: {other:?}"),
        }
    }

    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_polls_consume_once() {
    let (service, _) = create_test_service("F");
    let service = Arc::new(service);
    let issued = service.issue("10.0.0.7").await.unwrap();
    service.claim(&issued.id, &"user42".into()).await.unwrap();

    let polls: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = issued.id.clone();
            tokio::spawn(async move { service.poll(&id).await.unwrap() })
        })
        .collect();

    let mut successes = 0;
    for handle in polls {
        let outcome = handle.await.unwrap();
        if outcome.is_success() {
            successes += 1;
        } else {
            assert_eq!(outcome, PollOutcome::NotFound);
        }
    }

    assert_eq!(successes, 1, "A claimed ticket is reported exactly once");
}

#[tokio::test]
async fn test_failing_backend_never_fails_requests() {
    init_test_tracing();
    let backend = MockTicketBackend::new();
    backend.fail_loads(true);
    backend.fail_saves(true);

    let clock = ManualClock::new(test_clock().now());
    let service = TicketService::new(
        TableTicketStore::new(backend.clone()),
        SequentialIdGenerator::new(),
        clock,
        TicketConfig::default(),
    );

    let issued = service.issue("10.0.0.7").await.unwrap();
    assert_eq!(service.poll(&issued.id).await.unwrap(), PollOutcome::NotYet);
    assert_eq!(
        service.claim(&issued.id, &"user42".into()).await.unwrap(),
        ClaimOutcome::Success
    );
    assert_eq!(
        service.poll(&issued.id).await.unwrap(),
        PollOutcome::Success("user42".into())
    );
    assert!(backend.stored().is_empty());
}

#[tokio::test]
async fn test_claim_survives_restart() {
    init_test_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickets.json");
    let clock = ManualClock::new(test_clock().now());

    let first = TicketService::new(
        TableTicketStore::open(JsonFileBackend::new(&path)).await,
        SequentialIdGenerator::new(),
        clock.clone(),
        TicketConfig::default(),
    );
    let issued = first.issue("10.0.0.7").await.unwrap();
    first.claim(&issued.id, &"user42".into()).await.unwrap();
    drop(first);

    let second = TicketService::new(
        TableTicketStore::open(JsonFileBackend::new(&path)).await,
        SequentialIdGenerator::with_prefix("restart-"),
        clock,
        TicketConfig::default(),
    );

    assert_eq!(
        second.poll(&issued.id).await.unwrap(),
        PollOutcome::Success("user42".into())
    );
}

#[tokio::test]
async fn test_issue_sweeps_abandoned_tickets() {
    let (service, clock) = create_test_service("G");
    for _ in 0..5 {
        service.issue("10.0.0.7").await.unwrap();
    }

    clock.advance_secs(11);
    service.issue("10.0.0.8").await.unwrap();

    assert_eq!(service.store().len().await, 1);
}
