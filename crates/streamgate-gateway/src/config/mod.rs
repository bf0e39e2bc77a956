//! Gateway config loader (strict parsing, then environment overrides).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use streamgate_core::error::{GateError, Result};

pub use schema::{
    GatewayConfig, GatewaySection, LedgerBackend, LedgerSection, RulesSection, SeedSubscription,
};

/// Default config path; `STREAMGATE_CONFIG` overrides it.
pub const DEFAULT_CONFIG_PATH: &str = "streamgate.yaml";

/// Load from `STREAMGATE_CONFIG` (or `streamgate.yaml`), falling back to
/// defaults when the file does not exist, then apply process env overrides.
pub fn load() -> Result<GatewayConfig> {
    let path = std::env::var("STREAMGATE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut cfg = match fs::read_to_string(&path) {
        Ok(s) => parse(&s)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            GatewayConfig::default()
        }
        Err(e) => return Err(GateError::Internal(format!("read config failed: {e}"))),
    };
    cfg.apply_env(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse(s: &str) -> Result<GatewayConfig> {
    serde_yaml::from_str(s).map_err(|e| GateError::BadRequest(format!("invalid yaml: {e}")))
}
