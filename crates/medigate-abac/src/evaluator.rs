//! Policy evaluation engine (PDP).
//!
//! Evaluates an access request against a policy set in declaration order.
//! The first policy whose roles and attributes match the user governs the
//! request; its action set alone decides the outcome.

use medigate_types::{Action, Outcome, UserSnapshot};

use crate::policy::PolicySet;

// ============================================================================
// Evaluation
// ============================================================================

/// The result of evaluating an access request against a policy set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether access is permitted or denied.
    pub outcome: Outcome,
    /// The name of the governing policy, or `None` if no policy was eligible.
    pub matched_policy: Option<String>,
    /// Human-readable explanation of the outcome.
    pub reason: String,
}

impl Evaluation {
    /// Whether this evaluation grants access.
    pub fn is_permit(&self) -> bool {
        self.outcome == Outcome::Permit
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates an access request against a policy set.
///
/// Policies are consulted in declaration order:
///
/// 1. A policy whose role set does not contain the user's role is skipped.
/// 2. A policy with any unmet attribute requirement is skipped.
/// 3. The first remaining policy *governs* the request: if its action set
///    contains `action`, the result is PERMIT; otherwise DENY
///    "action not allowed for role" — evaluation stops either way. A later
///    policy can never override the governing one.
///
/// If no policy governs, the result is DENY "policy evaluation failed".
///
/// # Postcondition
///
/// Always returns an [`Evaluation`] — never panics on valid input.
pub fn evaluate(policies: &PolicySet, user: &UserSnapshot, action: &Action) -> Evaluation {
    for (name, policy) in policies.iter() {
        if !policy.eligible_for(user) {
            continue;
        }

        // First eligible policy governs; its action set is final.
        if policy.permits(action) {
            return Evaluation {
                outcome: Outcome::Permit,
                matched_policy: Some(name.to_string()),
                reason: "policy evaluation passed".to_string(),
            };
        }
        return Evaluation {
            outcome: Outcome::Deny,
            matched_policy: Some(name.to_string()),
            reason: "action not allowed for role".to_string(),
        };
    }

    Evaluation {
        outcome: Outcome::Deny,
        matched_policy: None,
        reason: "policy evaluation failed".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
