//! Access rules: request-local context, the policy seam, and the rules engine.
//!
//! A request flows through here as:
//! - `Subscription` snapshot + caller geography -> `AccessContext`
//! - every `Policy` in the injected `PolicySet` -> `PolicyResult`
//! - `RulesEngine` folds the results into one `AccessVerdict`
//!
//! Nothing in this module performs I/O or keeps state between calls.

pub mod clock;
pub mod context;
pub mod engine;
pub mod policies;
pub mod policy;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{AccessContext, StreamId, Subscription};
pub use engine::{AccessVerdict, RulesEngine};
pub use policies::{
    ExpiryPolicy, GeographyAllowListPolicy, GeographyPresencePolicy, RateLimitPolicy,
    REASON_GEOGRAPHY_NOT_ALLOWED, REASON_MISSING_GEOGRAPHY, REASON_RATE_LIMIT_EXCEEDED,
    REASON_SUBSCRIPTION_EXPIRED,
};
pub use policy::{FnPolicy, Policy, PolicyResult, PolicySet};
