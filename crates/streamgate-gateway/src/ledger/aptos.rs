//! Aptos fullnode ledger (REST v1).
//!
//! Reads go through two calls:
//! - `GET  /accounts/{contract}/resource/{contract}::data_marketplace::Marketplace`
//!   to find the subscriptions table handle
//! - `POST /tables/{handle}/item` keyed by `(subscriber, stream_id)`
//!
//! Writes are not signed or broadcast here: `record_access` builds the entry
//! function payload and hands it to the log for a sponsoring relayer.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use streamgate_core::error::{GateError, Result};
use streamgate_core::rules::{StreamId, Subscription};

use crate::config::LedgerSection;

use super::{AccessRecord, Ledger};

const MODULE: &str = "data_marketplace";

pub struct AptosLedger {
    client: reqwest::Client,
    node_url: String,
    contract_address: String,
}

#[derive(Debug, Deserialize)]
struct MarketplaceResource {
    data: MarketplaceData,
}

#[derive(Debug, Deserialize)]
struct MarketplaceData {
    subscriptions: TableRef,
}

#[derive(Debug, Deserialize)]
struct TableRef {
    handle: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
}

impl AptosLedger {
    pub fn new(cfg: &LedgerSection) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| GateError::Internal(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            node_url: cfg.node_url.trim_end_matches('/').to_string(),
            contract_address: cfg.contract_address.clone(),
        })
    }

    fn type_tag(&self, name: &str) -> String {
        format!("{}::{MODULE}::{name}", self.contract_address)
    }

    /// Entry function payload for `record_access(signature, stream_id)`.
    pub fn record_access_payload(&self, record: &AccessRecord) -> Value {
        json!({
            "type": "entry_function_payload",
            "sender": self.contract_address,
            "function": self.type_tag("record_access"),
            "type_arguments": [],
            "arguments": [record.signature, record.stream_id.to_string()],
        })
    }

    async fn subscriptions_handle(&self) -> Result<String> {
        let url = format!(
            "{}/accounts/{}/resource/{}",
            self.node_url,
            self.contract_address,
            self.type_tag("Marketplace")
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GateError::LookupFailed(format!("marketplace resource request: {e}")))?;

        if !resp.status().is_success() {
            return Err(GateError::LookupFailed(format!(
                "marketplace resource returned {}",
                resp.status()
            )));
        }

        let res: MarketplaceResource = resp
            .json()
            .await
            .map_err(|e| GateError::LookupFailed(format!("marketplace resource decode: {e}")))?;
        Ok(res.data.subscriptions.handle)
    }
}

#[async_trait]
impl Ledger for AptosLedger {
    fn network(&self) -> &str {
        &self.node_url
    }

    async fn get_subscription(
        &self,
        subscriber: &str,
        stream_id: StreamId,
    ) -> Result<Option<Subscription>> {
        let handle = self.subscriptions_handle().await?;

        let url = format!("{}/tables/{}/item", self.node_url, handle);
        let body = json!({
            "key_type": self.type_tag("SubscriptionKey"),
            "value_type": self.type_tag("Subscription"),
            "key": { "subscriber": subscriber, "stream_id": stream_id.to_string() },
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::LookupFailed(format!("table item request: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            // Only a missing table item means "no subscription"; anything else
            // behind a 404 (wrong handle, unknown route) is a fault.
            let err: ApiErrorBody = resp
                .json()
                .await
                .unwrap_or(ApiErrorBody { error_code: None });
            return match err.error_code.as_deref() {
                Some("table_item_not_found") => Ok(None),
                other => Err(GateError::LookupFailed(format!(
                    "table item 404: {}",
                    other.unwrap_or("no error_code")
                ))),
            };
        }
        if !status.is_success() {
            return Err(GateError::LookupFailed(format!("table item returned {status}")));
        }

        let sub: Subscription = resp
            .json()
            .await
            .map_err(|e| GateError::LookupFailed(format!("subscription decode: {e}")))?;
        Ok(Some(sub))
    }

    async fn record_access(&self, record: &AccessRecord) -> Result<()> {
        let payload = self.record_access_payload(record);
        tracing::info!(
            stream_id = %record.stream_id,
            subscriber = %record.subscriber,
            payload = %payload,
            "record_access payload ready for submission"
        );
        Ok(())
    }

    async fn verify_data_hash(&self, stream_id: StreamId, hash: &str) -> Result<()> {
        tracing::info!(%stream_id, %hash, "verify data hash");
        Ok(())
    }
}
