//! Lightweight in-process metrics (dependency-free).
//!
//! Access and publish outcomes plus ledger latency, stored as atomics and
//! rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::GatewayMetrics;
