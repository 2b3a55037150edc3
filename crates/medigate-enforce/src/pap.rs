//! The policy administration point.
//!
//! The [`PolicyStore`] itself is silent; this wrapper is the audited route
//! for mutating it. Every attempted mutation lands in the trail, including
//! failed removals.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use medigate_abac::{Policy, PolicyStore, PolicyStoreError};
use medigate_audit::{AuditEntry, AuditError, AuditLog};
use medigate_types::{Outcome, UserSnapshot};

/// Error type for policy administration.
#[derive(Debug, Error)]
pub enum PapError {
    /// The store rejected the mutation.
    #[error(transparent)]
    Store(#[from] PolicyStoreError),

    /// The mutation succeeded but could not be audited.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for policy administration.
pub type Result<T> = std::result::Result<T, PapError>;

/// Audited policy mutations.
pub struct PolicyAdministrationPoint {
    policies: Arc<PolicyStore>,
    audit: Arc<AuditLog>,
}

impl PolicyAdministrationPoint {
    /// Wires an administration point over the given store and trail.
    pub fn new(policies: Arc<PolicyStore>, audit: Arc<AuditLog>) -> Self {
        Self { policies, audit }
    }

    /// Inserts or replaces a named policy, recording the mutation.
    ///
    /// Returns the previous policy when one was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`PapError::Audit`] when the mutation cannot be recorded.
    pub fn add_policy(
        &self,
        actor: &UserSnapshot,
        name: &str,
        policy: Policy,
    ) -> Result<Option<Policy>> {
        let previous = self.policies.add(name, policy);
        let reason = if previous.is_some() {
            format!("policy replaced: {name}")
        } else {
            format!("policy added: {name}")
        };

        self.audit.append(AuditEntry::new(
            actor.id.clone(),
            actor.name.clone(),
            None,
            "add_policy",
            Outcome::Permit,
            reason,
        ))?;
        info!(actor = %actor.id, policy = %name, "policy administered");
        Ok(previous)
    }

    /// Removes a named policy, recording the attempt.
    ///
    /// # Errors
    ///
    /// A missing policy is reported to the caller as
    /// [`PolicyStoreError::PolicyNotFound`] *and* recorded as a DENY entry.
    pub fn remove_policy(&self, actor: &UserSnapshot, name: &str) -> Result<Policy> {
        match self.policies.remove(name) {
            Ok(removed) => {
                self.audit.append(AuditEntry::new(
                    actor.id.clone(),
                    actor.name.clone(),
                    None,
                    "remove_policy",
                    Outcome::Permit,
                    format!("policy removed: {name}"),
                ))?;
                info!(actor = %actor.id, policy = %name, "policy removed");
                Ok(removed)
            }
            Err(err) => {
                self.audit.append(AuditEntry::new(
                    actor.id.clone(),
                    actor.name.clone(),
                    None,
                    "remove_policy",
                    Outcome::Deny,
                    err.to_string(),
                ))?;
                Err(err.into())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use medigate_abac::StandardPolicies;
    use medigate_audit::AuditQuery;
    use medigate_types::Role;

    fn admin() -> UserSnapshot {
        UserSnapshot::new("u-3", "A. Diaz", Role::Admin).with_shift(true)
    }

    fn pap() -> (PolicyAdministrationPoint, Arc<AuditLog>) {
        let policies = Arc::new(PolicyStore::new());
        let audit = Arc::new(AuditLog::in_memory());
        (
            PolicyAdministrationPoint::new(policies, Arc::clone(&audit)),
            audit,
        )
    }

    #[test]
    fn add_is_audited_as_permit() {
        let (pap, audit) = pap();

        pap.add_policy(&admin(), "doctor_policy", StandardPolicies::doctor())
            .expect("add policy");

        let trail = audit.query(&AuditQuery::new());
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].outcome, Outcome::Permit);
        assert_eq!(trail[0].reason, "policy added: doctor_policy");
        assert_eq!(trail[0].resource, None);
    }

    #[test]
    fn replace_is_distinguished_from_add() {
        let (pap, audit) = pap();

        pap.add_policy(&admin(), "p", StandardPolicies::doctor())
            .expect("add");
        let previous = pap
            .add_policy(&admin(), "p", StandardPolicies::nurse())
            .expect("replace");

        assert_eq!(previous, Some(StandardPolicies::doctor()));
        let trail = audit.query(&AuditQuery::new());
        assert_eq!(trail[1].reason, "policy replaced: p");
    }

    #[test]
    fn failed_removal_is_reported_and_logged_as_deny() {
        let (pap, audit) = pap();

        let result = pap.remove_policy(&admin(), "ghost_policy");
        assert!(matches!(
            result,
            Err(PapError::Store(PolicyStoreError::PolicyNotFound(_)))
        ));

        let trail = audit.query(&AuditQuery::new());
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].outcome, Outcome::Deny);
        assert_eq!(trail[0].reason, "policy not found: ghost_policy");
    }

    #[test]
    fn successful_removal_is_audited_as_permit() {
        let (pap, audit) = pap();

        pap.add_policy(&admin(), "p", StandardPolicies::doctor())
            .expect("add");
        pap.remove_policy(&admin(), "p").expect("remove");

        let trail = audit.query(&AuditQuery::new().outcome(Outcome::Permit));
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1].reason, "policy removed: p");
    }
}
