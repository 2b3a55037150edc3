//! The policy enforcement point.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use medigate_abac::{PolicyStore, evaluate};
use medigate_audit::{AuditEntry, AuditLog};
use medigate_trust::{AttributeStore, ProviderError, TrustCheck, verify};
use medigate_types::{Action, Decision, Resource, UserId, UserSnapshot};

/// Error type for enforcement calls.
#[derive(Debug, Error)]
pub enum EnforceError {
    /// The user's attributes could not be loaded; no decision was made.
    #[error(transparent)]
    Attributes(#[from] ProviderError),
}

/// Result type for enforcement calls.
pub type Result<T> = std::result::Result<T, EnforceError>;

/// What to do when the audit trail cannot record a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditFailurePolicy {
    /// Force the decision to deny. An unauditable permit never leaves the
    /// engine.
    #[default]
    FailClosed,
    /// Deliver the computed decision anyway.
    FailOpen,
}

/// The single front door for routine access requests.
///
/// Each call runs the trust check, then (only on a pass) policy evaluation,
/// and appends exactly one audit entry before the decision is returned.
/// Calls are independent: no lock is held across calls and nothing is
/// retried.
pub struct EnforcementPoint {
    policies: Arc<PolicyStore>,
    attributes: Arc<AttributeStore>,
    audit: Arc<AuditLog>,
    on_audit_failure: AuditFailurePolicy,
}

impl EnforcementPoint {
    /// Wires an enforcement point with the default fail-closed audit policy.
    pub fn new(
        policies: Arc<PolicyStore>,
        attributes: Arc<AttributeStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            policies,
            attributes,
            audit,
            on_audit_failure: AuditFailurePolicy::default(),
        }
    }

    /// Overrides the audit-failure policy.
    #[must_use]
    pub fn with_audit_failure_policy(mut self, policy: AuditFailurePolicy) -> Self {
        self.on_audit_failure = policy;
        self
    }

    /// Decides an access request for an already-loaded user snapshot.
    ///
    /// # Errors
    ///
    /// Currently infallible for loaded snapshots; the `Result` matches
    /// [`Self::enforce_for`].
    pub fn enforce(
        &self,
        user: &UserSnapshot,
        action: &Action,
        resource: Option<&Resource>,
        device_id: &str,
        location: &str,
    ) -> Result<Decision> {
        let resource_id = resource.map(|r| r.id);

        let decision = match verify(user, device_id, location) {
            TrustCheck::Fail(failure) => Decision::deny(failure.reason(), resource_id),
            TrustCheck::Pass => {
                let evaluation = evaluate(&self.policies.snapshot(), user, action);
                Decision {
                    outcome: evaluation.outcome,
                    reason: evaluation.reason,
                    resource: resource_id,
                    timestamp: chrono::Utc::now(),
                }
            }
        };

        let entry = AuditEntry::new(
            user.id.clone(),
            user.name.clone(),
            resource_id,
            action.clone(),
            decision.outcome,
            decision.reason.clone(),
        );

        let decision = match self.audit.append(entry) {
            Ok(()) => decision,
            Err(err) => {
                error!(user = %user.id, action = %action, %err, "decision could not be audited");
                match self.on_audit_failure {
                    AuditFailurePolicy::FailClosed => {
                        Decision::deny("audit log unavailable", resource_id)
                    }
                    AuditFailurePolicy::FailOpen => decision,
                }
            }
        };

        if decision.is_permit() {
            info!(user = %user.id, action = %action, "access permitted");
        } else {
            warn!(user = %user.id, action = %action, reason = %decision.reason, "access denied");
        }
        Ok(decision)
    }

    /// Decides an access request for a user looked up by id.
    ///
    /// The snapshot comes from the attribute store (refreshed when stale).
    ///
    /// # Errors
    ///
    /// Returns [`EnforceError::Attributes`] when the user cannot be loaded;
    /// no decision is made and nothing is audited in that case.
    pub fn enforce_for(
        &self,
        user: &UserId,
        action: &Action,
        resource: Option<&Resource>,
        device_id: &str,
        location: &str,
    ) -> Result<Decision> {
        let snapshot = self.attributes.get(user)?;
        self.enforce(&snapshot, action, resource, device_id, location)
    }
}

impl std::fmt::Debug for EnforcementPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnforcementPoint")
            .field("on_audit_failure", &self.on_audit_failure)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
