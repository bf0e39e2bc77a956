//! Access orchestration against scripted ledgers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use streamgate_core::error::ClientCode;
use streamgate_core::rules::{
    AccessContext, FixedClock, FnPolicy, PolicyResult, PolicySet, RulesEngine, StreamId,
};
use streamgate_gateway::ledger::{Ledger, MemoryLedger};
use streamgate_gateway::obs::GatewayMetrics;
use streamgate_gateway::services::{AccessOutcome, AccessRequest, AccessService};

use common::{sub, Lookup, ScriptedLedger, NOW};

fn engine() -> Arc<RulesEngine> {
    Arc::new(RulesEngine::new(PolicySet::default_set(Arc::new(FixedClock(NOW)))))
}

fn service(ledger: Arc<dyn Ledger>) -> (AccessService, Arc<GatewayMetrics>) {
    let metrics = Arc::new(GatewayMetrics::default());
    let svc = AccessService::new(engine(), ledger, Arc::clone(&metrics), Duration::from_millis(200));
    (svc, metrics)
}

fn req(geo: &str) -> AccessRequest {
    AccessRequest {
        stream_id: StreamId(7),
        subscriber: "0xabc".into(),
        geography: geo.into(),
        signature: "sig".into(),
    }
}

#[tokio::test]
async fn grants_and_reports_next_usage() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60))));
    let (svc, metrics) = service(ledger.clone());

    let out = svc.handle(req("US")).await.unwrap();
    assert_eq!(
        out,
        AccessOutcome::Granted {
            expires_at: NOW + 60,
            usage: 4
        }
    );
    assert_eq!(ledger.commits(), 1);

    let rec = ledger.last_record.lock().unwrap().clone().unwrap();
    assert_eq!(rec.signature, "sig");
    assert_eq!(rec.stream_id, StreamId(7));
    assert_eq!(metrics.access_outcomes.get(&[("outcome", "granted")]), 1);
}

#[tokio::test]
async fn denial_skips_ledger_write() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Found(sub(1, 1, NOW + 60))));
    let (svc, metrics) = service(ledger.clone());

    let out = svc.handle(req("US")).await.unwrap();
    assert_eq!(
        out,
        AccessOutcome::Denied {
            reasons: vec!["rate_limit_exceeded".into()]
        }
    );
    assert_eq!(ledger.commits(), 0);
    assert_eq!(metrics.policy_denials.get(&[("reason", "rate_limit_exceeded")]), 1);
}

#[tokio::test]
async fn empty_geography_is_a_policy_denial() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Found(sub(10, 0, NOW + 60))));
    let (svc, _) = service(ledger.clone());

    match svc.handle(req("")).await.unwrap() {
        AccessOutcome::Denied { reasons } => assert_eq!(reasons, ["missing_geography"]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(ledger.lookups(), 1);
}

#[tokio::test]
async fn absent_subscription_never_reaches_engine() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let counting = FnPolicy::new("counting", move |_: &AccessContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        PolicyResult::allow()
    });
    let engine = Arc::new(RulesEngine::new(PolicySet::new().with(counting)));

    let ledger = Arc::new(ScriptedLedger::new(Lookup::Absent));
    let svc = AccessService::new(
        engine,
        ledger.clone(),
        Arc::new(GatewayMetrics::default()),
        Duration::from_millis(200),
    );

    assert_eq!(svc.handle(req("US")).await.unwrap(), AccessOutcome::NotFound);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.commits(), 0);
}

#[tokio::test]
async fn lookup_fault_is_internal_not_absent() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Fault));
    let (svc, metrics) = service(ledger.clone());

    let err = svc.handle(req("US")).await.expect_err("must fail");
    assert_eq!(err.client_code(), ClientCode::Internal);
    assert_eq!(metrics.access_outcomes.get(&[("outcome", "internal_error")]), 1);
    assert_eq!(ledger.commits(), 0);
}

#[tokio::test]
async fn commit_fault_is_internal_and_not_retried() {
    let mut scripted = ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60)));
    scripted.commit_fault = true;
    let ledger = Arc::new(scripted);
    let (svc, _) = service(ledger.clone());

    let err = svc.handle(req("US")).await.expect_err("must fail");
    assert_eq!(err.client_code(), ClientCode::Internal);
    assert_eq!(ledger.lookups(), 1);
    assert_eq!(ledger.commits(), 1);
}

#[tokio::test]
async fn lookup_timeout_is_a_fault() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Hang));
    let (svc, metrics) = service(ledger.clone());

    let err = svc.handle(req("US")).await.expect_err("must time out");
    assert_eq!(err.client_code(), ClientCode::Internal);
    assert_eq!(metrics.ledger_call_duration.count(&[("op", "get_subscription")]), 1);
}

#[tokio::test]
async fn malformed_request_rejected_before_ledger() {
    let ledger = Arc::new(ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60))));
    let (svc, _) = service(ledger.clone());

    let mut r = req("US");
    r.subscriber = " ".into();
    let err = svc.handle(r).await.expect_err("must fail");
    assert_eq!(err.client_code(), ClientCode::BadRequest);

    let mut r = req("US");
    r.signature = String::new();
    let err = svc.handle(r).await.expect_err("must fail");
    assert_eq!(err.client_code(), ClientCode::BadRequest);

    assert_eq!(ledger.lookups(), 0);
}

#[tokio::test]
async fn cancel_before_commit_writes_nothing() {
    let gate = Arc::new(Notify::new());
    let mut scripted = ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60)));
    scripted.lookup_gate = Some(Arc::clone(&gate));
    let ledger = Arc::new(scripted);
    let (svc, _) = service(ledger.clone());
    let svc = Arc::new(svc);

    let task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.handle(req("US")).await })
    };

    // Wait until the lookup is in flight, then drop the request.
    while ledger.lookups() == 0 {
        tokio::task::yield_now().await;
    }
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ledger.commits(), 0);
}

#[tokio::test]
async fn started_commit_survives_cancellation() {
    let gate = Arc::new(Notify::new());
    let mut scripted = ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60)));
    scripted.commit_gate = Some(Arc::clone(&gate));
    let ledger = Arc::new(scripted);
    let (svc, _) = service(ledger.clone());
    let svc = Arc::new(svc);

    let task = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.handle(req("US")).await })
    };

    tokio::time::timeout(Duration::from_secs(1), ledger.commit_started.notified())
        .await
        .expect("commit must start");
    task.abort();
    let _ = task.await;

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(1), ledger.commit_done.notified())
        .await
        .expect("commit must finish after caller went away");
    assert_eq!(ledger.commits(), 1);
}

#[tokio::test]
async fn commit_timeout_lets_write_finish() {
    let gate = Arc::new(Notify::new());
    let mut scripted = ScriptedLedger::new(Lookup::Found(sub(10, 3, NOW + 60)));
    scripted.commit_gate = Some(Arc::clone(&gate));
    let ledger = Arc::new(scripted);
    let (svc, metrics) = service(ledger.clone());

    // Held past the 200ms ledger timeout.
    let err = svc.handle(req("US")).await.expect_err("must time out");
    assert_eq!(err.client_code(), ClientCode::Internal);
    assert_eq!(ledger.commits(), 0);

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(1), ledger.commit_done.notified())
        .await
        .expect("write must finish after the timeout");
    assert_eq!(ledger.commits(), 1);
    assert_eq!(ledger.last_record.lock().unwrap().as_ref().map(|r| r.stream_id), Some(StreamId(7)));

    tokio::task::yield_now().await;
    assert_eq!(metrics.ledger_call_duration.count(&[("op", "record_access")]), 1);
}

#[tokio::test]
async fn memory_ledger_usage_advances_until_quota() {
    let mem = Arc::new(MemoryLedger::new("memory"));
    mem.insert_subscription("0xabc", StreamId(7), sub(2, 0, NOW + 60));
    let (svc, _) = service(mem.clone());

    assert!(matches!(
        svc.handle(req("US")).await.unwrap(),
        AccessOutcome::Granted { usage: 1, .. }
    ));
    assert!(matches!(
        svc.handle(req("US")).await.unwrap(),
        AccessOutcome::Granted { usage: 2, .. }
    ));
    assert_eq!(
        svc.handle(req("US")).await.unwrap(),
        AccessOutcome::Denied {
            reasons: vec!["rate_limit_exceeded".into()]
        }
    );
    assert_eq!(mem.subscription("0xabc", StreamId(7)).unwrap().queries_used, 2);
}
