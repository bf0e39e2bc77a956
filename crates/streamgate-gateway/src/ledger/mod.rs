//! Ledger collaborators.
//!
//! The gateway never owns subscription state. It reads a snapshot, asks the
//! ledger to record an access, and asks it to verify published data hashes.
//! `AptosLedger` talks to a fullnode; `MemoryLedger` keeps everything in
//! process for development and tests.

pub mod aptos;
pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::{StreamId, Subscription};

use crate::config::{GatewayConfig, LedgerBackend};
use crate::obs::metrics::GatewayMetrics;

pub use aptos::AptosLedger;
pub use memory::MemoryLedger;

/// One granted query, handed to the ledger for recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub subscriber: String,
    pub stream_id: StreamId,
    /// Opaque authenticity proof; only the ledger interprets it.
    pub signature: String,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Network identifier reported by `/health`.
    fn network(&self) -> &str;

    /// `Ok(None)` when no record exists; `Err(LookupFailed)` when the ledger
    /// could not be asked.
    async fn get_subscription(
        &self,
        subscriber: &str,
        stream_id: StreamId,
    ) -> Result<Option<Subscription>>;

    async fn record_access(&self, record: &AccessRecord) -> Result<()>;

    async fn verify_data_hash(&self, stream_id: StreamId, hash: &str) -> Result<()>;
}

/// Build the configured ledger backend.
pub fn from_config(cfg: &GatewayConfig) -> Result<Arc<dyn Ledger>> {
    let ledger: Arc<dyn Ledger> = match cfg.ledger.backend {
        LedgerBackend::Aptos => Arc::new(AptosLedger::new(&cfg.ledger)?),
        LedgerBackend::Memory => {
            let mem = MemoryLedger::new(cfg.ledger.node_url.clone());
            for s in &cfg.ledger.seed {
                mem.insert_subscription(
                    &s.subscriber,
                    StreamId(s.stream_id),
                    Subscription {
                        max_queries_per_period: s.max_queries_per_period,
                        queries_used: s.queries_used,
                        expiry: s.expiry,
                    },
                );
            }
            Arc::new(mem)
        }
    };
    Ok(ledger)
}

/// Bound a ledger call and record its latency under `op`.
///
/// An elapsed deadline is a fault, reported through `on_fault` like any
/// other collaborator failure.
pub async fn bounded<T, F>(
    metrics: &GatewayMetrics,
    op: &'static str,
    timeout: Duration,
    on_fault: fn(String) -> GateError,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let res = tokio::time::timeout(timeout, fut).await;
    metrics.ledger_call_duration.observe(&[("op", op)], started.elapsed());

    match res {
        Ok(inner) => inner,
        Err(_) => Err(on_fault(format!("{op} timed out after {}ms", timeout.as_millis()))),
    }
}
