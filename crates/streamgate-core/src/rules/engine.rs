use serde::Serialize;

use super::context::AccessContext;
use super::policy::PolicySet;

/// Aggregate decision of the rules engine.
///
/// `reasons` holds one entry per denying policy, in evaluation order, and is
/// empty exactly when `allowed` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessVerdict {
    allowed: bool,
    reasons: Vec<String>,
}

impl AccessVerdict {
    pub fn allowed(&self) -> bool {
        self.allowed
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn into_reasons(self) -> Vec<String> {
        self.reasons
    }
}

/// Applies every policy of an injected set to a context.
///
/// Stateless after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    policies: PolicySet,
}

impl RulesEngine {
    pub fn new(policies: PolicySet) -> Self {
        Self { policies }
    }

    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.names()
    }

    /// Evaluate all policies, collecting every violation (no short-circuit).
    pub fn evaluate_access(&self, ctx: &AccessContext) -> AccessVerdict {
        let mut allowed = true;
        let mut reasons = Vec::new();

        for policy in self.policies.iter() {
            let result = policy.evaluate(ctx);
            if !result.allowed() {
                allowed = false;
                tracing::debug!(policy = policy.name(), reason = result.reason(), "policy denied");
                reasons.push(result.into_reason());
            }
        }

        AccessVerdict { allowed, reasons }
    }
}
