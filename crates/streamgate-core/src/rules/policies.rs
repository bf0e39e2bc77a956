//! Built-in access policies.
//!
//! The default set (`PolicySet::default_set`) is rate limit, expiry, and
//! geography presence, in that order. `GeographyAllowListPolicy` is opt-in.

use std::collections::HashSet;
use std::sync::Arc;

use super::clock::Clock;
use super::context::AccessContext;
use super::policy::{Policy, PolicyResult, PolicySet};

pub const REASON_RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";
pub const REASON_SUBSCRIPTION_EXPIRED: &str = "subscription_expired";
pub const REASON_MISSING_GEOGRAPHY: &str = "missing_geography";
pub const REASON_GEOGRAPHY_NOT_ALLOWED: &str = "geography_not_allowed";

/// Denies once the period quota is used up. The request that would reach the
/// ceiling is already denied.
#[derive(Debug, Default, Clone, Copy)]
pub struct RateLimitPolicy;

impl Policy for RateLimitPolicy {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult {
        if ctx.queries_used >= ctx.max_queries_per_period {
            return PolicyResult::deny(REASON_RATE_LIMIT_EXCEEDED);
        }
        PolicyResult::allow()
    }
}

/// Denies when the subscription ended strictly before now. `expiry == now`
/// still allows.
#[derive(Clone)]
pub struct ExpiryPolicy {
    clock: Arc<dyn Clock>,
}

impl ExpiryPolicy {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Policy for ExpiryPolicy {
    fn name(&self) -> &'static str {
        "expiry"
    }

    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult {
        if ctx.expiry < self.clock.now_unix_secs() {
            return PolicyResult::deny(REASON_SUBSCRIPTION_EXPIRED);
        }
        PolicyResult::allow()
    }
}

/// Presence check only: any non-empty region code passes, whitespace included.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeographyPresencePolicy;

impl Policy for GeographyPresencePolicy {
    fn name(&self) -> &'static str {
        "geography"
    }

    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult {
        if ctx.geography.is_empty() {
            return PolicyResult::deny(REASON_MISSING_GEOGRAPHY);
        }
        PolicyResult::allow()
    }
}

/// Jurisdictional allow-list (case-insensitive).
///
/// An empty geography is left to `GeographyPresencePolicy` so the same request
/// does not collect two geography reasons.
#[derive(Debug, Clone)]
pub struct GeographyAllowListPolicy {
    allowed: HashSet<String>,
}

impl GeographyAllowListPolicy {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = regions
            .into_iter()
            .map(|r| r.as_ref().trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .collect();
        Self { allowed }
    }
}

impl Policy for GeographyAllowListPolicy {
    fn name(&self) -> &'static str {
        "geography_allowlist"
    }

    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult {
        if ctx.geography.is_empty() {
            return PolicyResult::allow();
        }
        if !self.allowed.contains(&ctx.geography.trim().to_ascii_uppercase()) {
            return PolicyResult::deny(REASON_GEOGRAPHY_NOT_ALLOWED);
        }
        PolicyResult::allow()
    }
}

impl PolicySet {
    /// Rate limit, expiry, geography presence.
    pub fn default_set(clock: Arc<dyn Clock>) -> Self {
        PolicySet::new()
            .with(RateLimitPolicy)
            .with(ExpiryPolicy::new(clock))
            .with(GeographyPresencePolicy)
    }
}
