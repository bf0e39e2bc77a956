use std::net::SocketAddr;

use serde::Deserialize;
use streamgate_core::error::{GateError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub ledger: LedgerSection,

    #[serde(default)]
    pub rules: RulesSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            ledger: LedgerSection::default(),
            rules: RulesSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GateError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.ledger.validate()?;
        self.rules.validate()?;

        Ok(())
    }

    /// Apply `APTOS_NODE_URL`, `CONTRACT_ADDRESS` and `PORT` on top of the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("APTOS_NODE_URL") {
            self.ledger.node_url = url;
        }
        if let Some(addr) = lookup("CONTRACT_ADDRESS") {
            self.ledger.contract_address = addr;
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| GateError::BadRequest(format!("PORT must be a valid port, got {port:?}")))?;
            let mut listen = self.gateway.listen_addr()?;
            listen.set_port(port);
            self.gateway.listen = listen.to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            GateError::BadRequest(format!(
                "gateway.listen must be a valid SocketAddr, got {:?}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// Aptos fullnode REST API.
    #[default]
    Aptos,
    /// Process-local ledger for development and tests.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerSection {
    #[serde(default)]
    pub backend: LedgerBackend,

    #[serde(default = "default_node_url")]
    pub node_url: String,

    #[serde(default = "default_contract_address")]
    pub contract_address: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Initial subscriptions for the memory backend.
    #[serde(default)]
    pub seed: Vec<SeedSubscription>,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::default(),
            node_url: default_node_url(),
            contract_address: default_contract_address(),
            timeout_ms: default_timeout_ms(),
            seed: Vec::new(),
        }
    }
}

impl LedgerSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.node_url.starts_with("http://") || self.node_url.starts_with("https://")) {
            return Err(GateError::BadRequest(
                "ledger.node_url must start with http:// or https://".into(),
            ));
        }
        let hex = self.contract_address.strip_prefix("0x").unwrap_or_default();
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(GateError::BadRequest(
                "ledger.contract_address must be a 0x-prefixed hex address".into(),
            ));
        }
        if !(100..=60000).contains(&self.timeout_ms) {
            return Err(GateError::BadRequest(
                "ledger.timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if !self.seed.is_empty() && self.backend != LedgerBackend::Memory {
            return Err(GateError::BadRequest(
                "ledger.seed is only supported by the memory backend".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSubscription {
    pub subscriber: String,
    pub stream_id: u64,
    pub max_queries_per_period: u64,
    #[serde(default)]
    pub queries_used: u64,
    pub expiry: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesSection {
    /// Empty means presence check only.
    #[serde(default)]
    pub geography_allowlist: Vec<String>,
}

impl RulesSection {
    pub fn validate(&self) -> Result<()> {
        if self.geography_allowlist.iter().any(|g| g.trim().is_empty()) {
            return Err(GateError::BadRequest(
                "rules.geography_allowlist must not contain blank entries".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:4000".into()
}
fn default_node_url() -> String {
    "https://fullnode.mainnet.aptoslabs.com/v1".into()
}
fn default_contract_address() -> String {
    "0xCAFE".into()
}
fn default_timeout_ms() -> u64 {
    5000
}
