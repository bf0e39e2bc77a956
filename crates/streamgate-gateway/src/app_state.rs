//! Shared application state for the streamgate gateway.
//!
//! Built once at startup from the loaded config. Holds the ledger backend,
//! metrics and the services; the rules engine lives inside `AccessService`.

use std::sync::Arc;
use std::time::Duration;

use streamgate_core::error::Result;
use streamgate_core::rules::{Clock, GeographyAllowListPolicy, PolicySet, RulesEngine, SystemClock};

use crate::config::GatewayConfig;
use crate::ledger::{self, Ledger};
use crate::obs::GatewayMetrics;
use crate::services::{AccessService, PublishService};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    ledger: Arc<dyn Ledger>,
    metrics: Arc<GatewayMetrics>,
    access: AccessService,
    publish: PublishService,
}

/// Default policies plus the configured extensions.
pub fn build_policy_set(cfg: &GatewayConfig, clock: Arc<dyn Clock>) -> PolicySet {
    let mut set = PolicySet::default_set(clock);
    if !cfg.rules.geography_allowlist.is_empty() {
        set = set.with(GeographyAllowListPolicy::new(&cfg.rules.geography_allowlist));
    }
    set
}

impl AppState {
    /// Build application state with the configured ledger backend.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let ledger = ledger::from_config(&cfg)?;
        Ok(Self::with_ledger(cfg, ledger, Arc::new(SystemClock)))
    }

    /// Build with an explicit ledger and clock.
    pub fn with_ledger(cfg: GatewayConfig, ledger: Arc<dyn Ledger>, clock: Arc<dyn Clock>) -> Self {
        let engine = Arc::new(RulesEngine::new(build_policy_set(&cfg, clock)));
        tracing::info!(policies = ?engine.policy_names(), network = ledger.network(), "rules engine ready");

        let metrics = Arc::new(GatewayMetrics::default());
        let timeout = Duration::from_millis(cfg.ledger.timeout_ms);

        let access = AccessService::new(engine, Arc::clone(&ledger), Arc::clone(&metrics), timeout);
        let publish = PublishService::new(Arc::clone(&ledger), Arc::clone(&metrics), timeout);

        Self {
            inner: Arc::new(AppStateInner {
                ledger,
                metrics,
                access,
                publish,
            }),
        }
    }

    pub fn network(&self) -> &str {
        self.inner.ledger.network()
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn access(&self) -> &AccessService {
        &self.inner.access
    }

    pub fn publish(&self) -> &PublishService {
        &self.inner.publish
    }
}
