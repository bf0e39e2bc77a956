use std::fmt;
use std::sync::Arc;

use super::context::AccessContext;

/// Outcome of a single policy.
///
/// `reason` is empty exactly when `allowed` is true; the constructors are the
/// only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResult {
    allowed: bool,
    reason: String,
}

impl PolicyResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    /// Deny with a reason code. An empty reason is replaced by `policy_denied`.
    pub fn deny(reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        if reason.is_empty() {
            reason = "policy_denied".to_string();
        }
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn into_reason(self) -> String {
        self.reason
    }
}

/// One independent access rule.
///
/// Implementations must be pure and total: no I/O, no interior state, and a
/// result that depends only on the context (and any configuration captured at
/// construction).
pub trait Policy: Send + Sync {
    /// Stable name, used in logs.
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult;
}

/// Adapter turning a plain function or closure into a `Policy`.
pub struct FnPolicy<F> {
    name: &'static str,
    f: F,
}

impl<F> FnPolicy<F>
where
    F: Fn(&AccessContext) -> PolicyResult + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Policy for FnPolicy<F>
where
    F: Fn(&AccessContext) -> PolicyResult + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, ctx: &AccessContext) -> PolicyResult {
        (self.f)(ctx)
    }
}

/// Ordered collection of policies applied to one context.
///
/// Order decides the order of reasons in a verdict, never the decision.
#[derive(Clone, Default)]
pub struct PolicySet {
    policies: Vec<Arc<dyn Policy>>,
}

impl PolicySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.push(Arc::new(policy));
        self
    }

    pub fn push(&mut self, policy: Arc<dyn Policy>) {
        self.policies.push(policy);
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Policy>> {
        self.policies.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }
}

impl fmt::Debug for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
