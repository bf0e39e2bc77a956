//! Scripted ledger shared by gateway tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::{StreamId, Subscription};
use streamgate_gateway::ledger::{AccessRecord, Ledger};

pub const NOW: i64 = 1_700_000_000;

pub fn sub(max: u64, used: u64, expiry: i64) -> Subscription {
    Subscription {
        max_queries_per_period: max,
        queries_used: used,
        expiry,
    }
}

#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Subscription),
    Absent,
    Fault,
    /// Never answers; exercises the timeout.
    Hang,
}

pub struct ScriptedLedger {
    pub lookup: Lookup,
    pub commit_fault: bool,
    pub verify_fault: bool,

    pub lookups: AtomicUsize,
    pub commits: AtomicUsize,
    pub verifies: AtomicUsize,
    pub last_record: std::sync::Mutex<Option<AccessRecord>>,

    /// When set, lookups wait for a permit before answering.
    pub lookup_gate: Option<Arc<Notify>>,
    /// When set, commits signal `commit_started`, then wait for a permit.
    pub commit_gate: Option<Arc<Notify>>,
    pub commit_started: Arc<Notify>,
    pub commit_done: Arc<Notify>,
}

impl ScriptedLedger {
    pub fn new(lookup: Lookup) -> Self {
        Self {
            lookup,
            commit_fault: false,
            verify_fault: false,
            lookups: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            verifies: AtomicUsize::new(0),
            last_record: std::sync::Mutex::new(None),
            lookup_gate: None,
            commit_gate: None,
            commit_started: Arc::new(Notify::new()),
            commit_done: Arc::new(Notify::new()),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn verifies(&self) -> usize {
        self.verifies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Ledger for ScriptedLedger {
    fn network(&self) -> &str {
        "scripted"
    }

    async fn get_subscription(
        &self,
        _subscriber: &str,
        _stream_id: StreamId,
    ) -> Result<Option<Subscription>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.lookup_gate {
            gate.notified().await;
        }
        match &self.lookup {
            Lookup::Found(s) => Ok(Some(s.clone())),
            Lookup::Absent => Ok(None),
            Lookup::Fault => Err(GateError::LookupFailed("node unreachable".into())),
            Lookup::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }

    async fn record_access(&self, record: &AccessRecord) -> Result<()> {
        if let Some(gate) = &self.commit_gate {
            self.commit_started.notify_one();
            gate.notified().await;
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        *self.last_record.lock().unwrap() = Some(record.clone());
        self.commit_done.notify_one();
        if self.commit_fault {
            return Err(GateError::CommitFailed("tx rejected".into()));
        }
        Ok(())
    }

    async fn verify_data_hash(&self, _stream_id: StreamId, _hash: &str) -> Result<()> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        if self.verify_fault {
            return Err(GateError::VerificationFailed("hash mismatch".into()));
        }
        Ok(())
    }
}
