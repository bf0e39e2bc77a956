//! Access orchestration: resolve -> evaluate -> commit.
//!
//! The only suspension points are the two ledger calls. Nothing is shared
//! between concurrent requests except the ledger itself; the read-decide-write
//! sequence is not locked, so two racing requests may both pass the rate limit
//! on the same snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::{AccessContext, RulesEngine, StreamId};

use crate::ledger::{bounded, AccessRecord, Ledger};
use crate::obs::GatewayMetrics;

/// A parsed access request.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub stream_id: StreamId,
    pub subscriber: String,
    /// Passed to the rules engine as-is; blank is a policy matter, not a
    /// malformed request.
    pub geography: String,
    pub signature: String,
}

impl AccessRequest {
    fn validate(&self) -> Result<()> {
        if self.subscriber.trim().is_empty() {
            return Err(GateError::BadRequest("subscriber must not be empty".into()));
        }
        if self.signature.trim().is_empty() {
            return Err(GateError::BadRequest("signature must not be empty".into()));
        }
        Ok(())
    }
}

/// Terminal non-fault outcomes. Faults come back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted { expires_at: i64, usage: u64 },
    NotFound,
    Denied { reasons: Vec<String> },
}

impl AccessOutcome {
    fn label(&self) -> &'static str {
        match self {
            AccessOutcome::Granted { .. } => "granted",
            AccessOutcome::NotFound => "not_found",
            AccessOutcome::Denied { .. } => "denied",
        }
    }
}

pub struct AccessService {
    engine: Arc<RulesEngine>,
    ledger: Arc<dyn Ledger>,
    metrics: Arc<GatewayMetrics>,
    ledger_timeout: Duration,
}

impl AccessService {
    pub fn new(
        engine: Arc<RulesEngine>,
        ledger: Arc<dyn Ledger>,
        metrics: Arc<GatewayMetrics>,
        ledger_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            ledger,
            metrics,
            ledger_timeout,
        }
    }

    pub async fn handle(&self, req: AccessRequest) -> Result<AccessOutcome> {
        let res = self.run(req).await;
        let label = match &res {
            Ok(outcome) => outcome.label(),
            Err(e) => e.client_code().as_str(),
        };
        self.metrics.access_outcomes.inc(&[("outcome", label)]);
        res
    }

    async fn run(&self, req: AccessRequest) -> Result<AccessOutcome> {
        req.validate()?;

        // Resolving
        let lookup = bounded(
            &self.metrics,
            "get_subscription",
            self.ledger_timeout,
            GateError::LookupFailed,
            self.ledger.get_subscription(&req.subscriber, req.stream_id),
        )
        .await;

        let sub = match lookup {
            Ok(Some(sub)) => sub,
            Ok(None) => {
                tracing::info!(stream_id = %req.stream_id, subscriber = %req.subscriber, "subscription not found");
                return Ok(AccessOutcome::NotFound);
            }
            Err(e) => {
                tracing::error!(stream_id = %req.stream_id, error = %e, "subscription lookup failed");
                return Err(e);
            }
        };

        // Evaluating
        let ctx = AccessContext::from_subscription(&sub, req.geography.as_str());
        let verdict = self.engine.evaluate_access(&ctx);
        if !verdict.allowed() {
            for reason in verdict.reasons() {
                self.metrics.policy_denials.inc(&[("reason", reason.as_str())]);
            }
            tracing::info!(
                stream_id = %req.stream_id,
                subscriber = %req.subscriber,
                verdict = %serde_json::to_value(&verdict).unwrap_or_default(),
                "access denied"
            );
            return Ok(AccessOutcome::Denied {
                reasons: verdict.into_reasons(),
            });
        }

        // Committing
        let record = AccessRecord {
            subscriber: req.subscriber,
            stream_id: req.stream_id,
            signature: req.signature,
        };
        self.commit(record).await?;

        Ok(AccessOutcome::Granted {
            expires_at: sub.expiry,
            usage: sub.queries_used.saturating_add(1),
        })
    }

    /// Record the access on a detached task.
    ///
    /// Dropping the request before this point skips the write. Once the task
    /// is spawned the write runs to completion even if the caller goes away or
    /// the wait below times out; the task logs its own outcome. The timeout
    /// bounds only how long the request waits for it.
    async fn commit(&self, record: AccessRecord) -> Result<()> {
        let ledger = Arc::clone(&self.ledger);
        let metrics = Arc::clone(&self.metrics);

        let mut task = tokio::spawn(async move {
            let started = Instant::now();
            let res = ledger.record_access(&record).await;
            metrics
                .ledger_call_duration
                .observe(&[("op", "record_access")], started.elapsed());
            match &res {
                Ok(()) => tracing::info!(
                    stream_id = %record.stream_id,
                    subscriber = %record.subscriber,
                    "access recorded"
                ),
                Err(e) => tracing::error!(
                    stream_id = %record.stream_id,
                    subscriber = %record.subscriber,
                    error = %e,
                    "access commit failed"
                ),
            }
            res
        });

        match tokio::time::timeout(self.ledger_timeout, &mut task).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "access commit task aborted");
                Err(GateError::CommitFailed(format!("commit task: {e}")))
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.ledger_timeout.as_millis() as u64,
                    "access commit still pending, continuing detached"
                );
                Err(GateError::CommitFailed(format!(
                    "record_access pending after {}ms",
                    self.ledger_timeout.as_millis()
                )))
            }
        }
    }
}
