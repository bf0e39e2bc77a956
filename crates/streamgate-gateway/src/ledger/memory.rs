use async_trait::async_trait;
use dashmap::DashMap;

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::{StreamId, Subscription};

use super::{AccessRecord, Ledger};

/// Process-local ledger.
///
/// Hash verification is strict only for streams with registered commitments;
/// streams without any accept every hash.
pub struct MemoryLedger {
    network: String,
    subscriptions: DashMap<(String, StreamId), Subscription>,
    commitments: DashMap<StreamId, Vec<String>>,
}

impl MemoryLedger {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            subscriptions: DashMap::new(),
            commitments: DashMap::new(),
        }
    }

    pub fn insert_subscription(&self, subscriber: &str, stream_id: StreamId, sub: Subscription) {
        self.subscriptions.insert((subscriber.to_string(), stream_id), sub);
    }

    pub fn subscription(&self, subscriber: &str, stream_id: StreamId) -> Option<Subscription> {
        self.subscriptions
            .get(&(subscriber.to_string(), stream_id))
            .map(|e| e.value().clone())
    }

    pub fn commit_hash(&self, stream_id: StreamId, hash: &str) {
        self.commitments
            .entry(stream_id)
            .or_default()
            .push(hash.to_ascii_lowercase());
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn network(&self) -> &str {
        &self.network
    }

    async fn get_subscription(
        &self,
        subscriber: &str,
        stream_id: StreamId,
    ) -> Result<Option<Subscription>> {
        Ok(self.subscription(subscriber, stream_id))
    }

    async fn record_access(&self, record: &AccessRecord) -> Result<()> {
        let key = (record.subscriber.clone(), record.stream_id);
        let mut sub = self.subscriptions.get_mut(&key).ok_or_else(|| {
            GateError::CommitFailed(format!(
                "no subscription for {} on stream {}",
                record.subscriber, record.stream_id
            ))
        })?;
        sub.queries_used = sub.queries_used.saturating_add(1);
        Ok(())
    }

    async fn verify_data_hash(&self, stream_id: StreamId, hash: &str) -> Result<()> {
        let Some(known) = self.commitments.get(&stream_id) else {
            return Ok(());
        };
        let hash = hash.to_ascii_lowercase();
        if known.iter().any(|h| *h == hash) {
            Ok(())
        } else {
            Err(GateError::VerificationFailed(format!(
                "hash not committed for stream {stream_id}"
            )))
        }
    }
}
