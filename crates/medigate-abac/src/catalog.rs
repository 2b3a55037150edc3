//! Standard policy catalog.
//!
//! Pre-built per-role policies for a hospital deployment. Each constructor
//! returns one policy; [`StandardPolicies::catalog`] returns the full set in
//! its canonical declaration order.

use medigate_types::Role;

use crate::policy::Policy;

/// Named constructors for the standard hospital policy set.
pub struct StandardPolicies;

impl StandardPolicies {
    /// Emergency-team doctors: full record access plus approval requests.
    pub fn doctor() -> Policy {
        Policy::for_roles([Role::Doctor])
            .require_team("emergency")
            .allow_actions(["read", "update", "write", "delete", "request_approval"])
    }

    /// Emergency-team nurses: record access without write.
    pub fn nurse() -> Policy {
        Policy::for_roles([Role::Nurse])
            .require_team("emergency")
            .allow_actions(["read", "update", "delete", "request_approval"])
    }

    /// Administrators: management actions across teams (no team requirement).
    pub fn admin() -> Policy {
        Policy::for_roles([Role::Admin]).allow_actions([
            "read",
            "update",
            "manage",
            "delete",
            "create",
            "approve",
            "revoke_access",
        ])
    }

    /// Ambulance crews attached to the emergency team: read/update only.
    pub fn ambulance() -> Policy {
        Policy::for_roles([Role::Ambulance])
            .require_team("emergency")
            .allow_actions(["read", "update"])
    }

    /// Pharmacy-team pharmacists, including inventory management.
    pub fn pharmacist() -> Policy {
        Policy::for_roles([Role::Pharmacist])
            .require_team("pharmacy")
            .allow_actions(["read", "update", "write", "modify_inventory"])
    }

    /// Receptionists: scheduling and intake, across teams.
    pub fn receptionist() -> Policy {
        Policy::for_roles([Role::Receptionist])
            .allow_actions(["read", "create", "schedule_appointments"])
    }

    /// Lab-team technicians, including report generation.
    pub fn lab_technician() -> Policy {
        Policy::for_roles([Role::LabTechnician])
            .require_team("lab")
            .allow_actions(["read", "update", "generate_reports"])
    }

    /// Billing-team clerks.
    pub fn billing_clerk() -> Policy {
        Policy::for_roles([Role::BillingClerk])
            .require_team("billing")
            .allow_actions(["read", "update", "manage_billing"])
    }

    /// Surgery-team surgeons.
    pub fn surgeon() -> Policy {
        Policy::for_roles([Role::Surgeon])
            .require_team("surgery")
            .allow_actions(["read", "update", "write", "delete", "perform_surgery"])
    }

    /// Surgery-team anesthesiologists.
    pub fn anesthesiologist() -> Policy {
        Policy::for_roles([Role::Anesthesiologist])
            .require_team("surgery")
            .allow_actions(["read", "update", "write", "administer_anesthesia"])
    }

    /// Emergency-team physicians, including treatment prescription.
    pub fn physician() -> Policy {
        Policy::for_roles([Role::Physician])
            .require_team("emergency")
            .allow_actions(["read", "update", "prescribe_treatment"])
    }

    /// Radiology-team X-ray technicians, including image management.
    pub fn xray_technician() -> Policy {
        Policy::for_roles([Role::XrayTechnician])
            .require_team("radiology")
            .allow_actions(["read", "update", "manage_images"])
    }

    /// The full standard catalog, in canonical declaration order.
    ///
    /// Order matters: the first eligible policy governs a request, so the
    /// catalog declares one policy per role and keeps role policies disjoint.
    pub fn catalog() -> Vec<(String, Policy)> {
        vec![
            ("doctor_policy".to_string(), Self::doctor()),
            ("nurse_policy".to_string(), Self::nurse()),
            ("admin_policy".to_string(), Self::admin()),
            ("ambulance_policy".to_string(), Self::ambulance()),
            ("pharmacist_policy".to_string(), Self::pharmacist()),
            ("receptionist_policy".to_string(), Self::receptionist()),
            ("lab_technician_policy".to_string(), Self::lab_technician()),
            ("billing_clerk_policy".to_string(), Self::billing_clerk()),
            ("surgeon_policy".to_string(), Self::surgeon()),
            (
                "anesthesiologist_policy".to_string(),
                Self::anesthesiologist(),
            ),
            ("physician_policy".to_string(), Self::physician()),
            (
                "xray_technician_policy".to_string(),
                Self::xray_technician(),
            ),
        ]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::policy::PolicySet;
    use medigate_types::{Action, Outcome, UserSnapshot};

    fn catalog_set() -> PolicySet {
        PolicySet::from_entries(StandardPolicies::catalog())
    }

    #[test]
    fn catalog_covers_every_role() {
        let policies = StandardPolicies::catalog();
        assert_eq!(policies.len(), 12);

        for role in [
            Role::Doctor,
            Role::Nurse,
            Role::Admin,
            Role::Ambulance,
            Role::Pharmacist,
            Role::Receptionist,
            Role::LabTechnician,
            Role::BillingClerk,
            Role::Surgeon,
            Role::Anesthesiologist,
            Role::Physician,
            Role::XrayTechnician,
        ] {
            assert!(
                policies.iter().any(|(_, p)| p.roles.contains(&role)),
                "no catalog policy covers {role}"
            );
        }
    }

    #[test]
    fn role_policies_are_disjoint() {
        let policies = StandardPolicies::catalog();
        for (i, (name_a, a)) in policies.iter().enumerate() {
            for (name_b, b) in policies.iter().skip(i + 1) {
                assert!(
                    a.roles.is_disjoint(&b.roles),
                    "{name_a} and {name_b} overlap"
                );
            }
        }
    }

    #[test]
    fn surgeon_can_perform_surgery_in_surgery_team() {
        let user = UserSnapshot::new("u-9", "Dr. Tanaka", Role::Surgeon)
            .with_shift(true)
            .with_team("surgery");

        let eval = evaluate(&catalog_set(), &user, &Action::new("perform_surgery"));
        assert_eq!(eval.outcome, Outcome::Permit);
        assert_eq!(eval.matched_policy.as_deref(), Some("surgeon_policy"));
    }

    #[test]
    fn admin_policy_has_no_team_requirement() {
        let user = UserSnapshot::new("u-3", "A. Diaz", Role::Admin).with_team("billing");
        let eval = evaluate(&catalog_set(), &user, &Action::new("manage"));
        assert_eq!(eval.outcome, Outcome::Permit);
    }

    #[test]
    fn nurse_cannot_write() {
        let user = UserSnapshot::new("u-2", "N. Okafor", Role::Nurse)
            .with_shift(true)
            .with_team("emergency");

        let eval = evaluate(&catalog_set(), &user, &Action::new("write"));
        assert_eq!(eval.outcome, Outcome::Deny);
        assert_eq!(eval.reason, "action not allowed for role");
    }

    #[test]
    fn doctor_outside_emergency_team_matches_nothing() {
        let user = UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor)
            .with_shift(true)
            .with_team("pharmacy");

        let eval = evaluate(&catalog_set(), &user, &Action::new("update"));
        assert_eq!(eval.outcome, Outcome::Deny);
        assert_eq!(eval.reason, "policy evaluation failed");
    }
}
