//! streamgate core: the access-decision pipeline and the shared error surface.
//!
//! This crate holds the request-local data model (`AccessContext`,
//! `PolicyResult`, `AccessVerdict`), the `Policy` seam with the default
//! policies, and the `RulesEngine` that folds a `PolicySet` into a verdict.
//! It carries no transport or runtime dependencies so the decision logic can
//! be exercised without a ledger or an HTTP stack.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `GateError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod rules;

/// Shared result type.
pub use error::{ClientCode, GateError, Result};
pub use rules::{
    AccessContext, AccessVerdict, Clock, FixedClock, Policy, PolicyResult, PolicySet, RulesEngine,
    StreamId, Subscription, SystemClock,
};
