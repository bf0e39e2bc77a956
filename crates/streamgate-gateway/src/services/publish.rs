use std::sync::Arc;
use std::time::Duration;

use serde_json::value::RawValue;

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::StreamId;

use crate::ledger::{bounded, Ledger};
use crate::obs::GatewayMetrics;

/// Publish path: verify a payload's content hash against the ledger.
///
/// Independent of the rules engine. The payload is kept as raw JSON and is
/// not persisted.
pub struct PublishService {
    ledger: Arc<dyn Ledger>,
    metrics: Arc<GatewayMetrics>,
    ledger_timeout: Duration,
}

impl PublishService {
    pub fn new(ledger: Arc<dyn Ledger>, metrics: Arc<GatewayMetrics>, ledger_timeout: Duration) -> Self {
        Self {
            ledger,
            metrics,
            ledger_timeout,
        }
    }

    pub async fn publish(
        &self,
        stream_id: StreamId,
        payload: Option<&RawValue>,
        hash: &str,
    ) -> Result<StreamId> {
        let res = self.run(stream_id, payload, hash).await;
        let label = match &res {
            Ok(_) => "stored",
            Err(e) => e.client_code().as_str(),
        };
        self.metrics.publish_outcomes.inc(&[("outcome", label)]);
        res
    }

    async fn run(&self, stream_id: StreamId, payload: Option<&RawValue>, hash: &str) -> Result<StreamId> {
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(GateError::BadRequest("hash must not be empty".into()));
        }

        bounded(
            &self.metrics,
            "verify_data_hash",
            self.ledger_timeout,
            GateError::VerificationFailed,
            self.ledger.verify_data_hash(stream_id, hash),
        )
        .await
        .map_err(|e| {
            tracing::error!(%stream_id, error = %e, "publish verification failed");
            e
        })?;

        let payload_bytes = payload.map(|p| p.get().len()).unwrap_or(0);
        tracing::info!(%stream_id, %hash, payload_bytes, "payload accepted");
        Ok(stream_id)
    }
}
