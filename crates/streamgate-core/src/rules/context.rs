//! Request-local evaluation context and the ledger snapshot it is built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GateError;

/// Marketplace stream identifier (the `:id` path segment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for StreamId {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(StreamId)
            .map_err(|_| GateError::BadRequest(format!("invalid stream id: {s}")))
    }
}

/// Ledger record of a subscriber's entitlement for a stream.
///
/// Read-only snapshot: the ledger owns and mutates it. Move `u64` fields
/// arrive as decimal strings over the REST API, so both strings and numbers
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(deserialize_with = "lenient_u64")]
    pub max_queries_per_period: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub queries_used: u64,
    #[serde(deserialize_with = "lenient_i64")]
    pub expiry: i64,
}

/// Everything a policy may look at. Built fresh per request, never persisted.
///
/// All fields are required by construction; there is no partially filled
/// context to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    /// Region code asserted by the caller (not verified here).
    pub geography: String,
    pub max_queries_per_period: u64,
    pub queries_used: u64,
    /// Subscription end, Unix seconds.
    pub expiry: i64,
}

impl AccessContext {
    pub fn new(
        geography: impl Into<String>,
        max_queries_per_period: u64,
        queries_used: u64,
        expiry: i64,
    ) -> Self {
        Self {
            geography: geography.into(),
            max_queries_per_period,
            queries_used,
            expiry,
        }
    }

    pub fn from_subscription(sub: &Subscription, geography: impl Into<String>) -> Self {
        Self::new(geography, sub.max_queries_per_period, sub.queries_used, sub.expiry)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Num(serde_json::Number),
    Str(String),
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    use serde::de::Error;
    match NumOrString::deserialize(d)? {
        NumOrString::Num(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {n}"))),
        NumOrString::Str(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("expected unsigned integer string, got {s:?}"))),
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    use serde::de::Error;
    match NumOrString::deserialize(d)? {
        NumOrString::Num(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {n}"))),
        NumOrString::Str(s) => s
            .parse()
            .map_err(|_| D::Error::custom(format!("expected integer string, got {s:?}"))),
    }
}
