//! The decision-making layer: enforcement, administration, and emergency
//! override.
//!
//! ```text
//!              ┌──────────────────┐   trust check   ┌────────────────┐
//!   request ──▶│ EnforcementPoint │────────────────▶│ TrustVerifier  │
//!              │      (PEP)       │   policy eval   ├────────────────┤
//!              │                  │────────────────▶│ PolicyStore    │
//!              └────────┬─────────┘                 └────────────────┘
//!                       │ one audit entry per call
//!                       ▼
//!              ┌──────────────────┐        ┌───────────────────────┐
//!              │     AuditLog     │◀───────│ PolicyAdministration  │
//!              └──────────────────┘        │ Point (PAP)           │
//!                       ▲                  └───────────────────────┘
//!                       │
//!              ┌──────────────────┐
//!              │ BreakGlassManager│  supervised emergency override
//!              └──────────────────┘
//! ```
//!
//! The [`EnforcementPoint`] is the single front door for routine requests:
//! continuous trust verification first, policy evaluation only on a pass,
//! and exactly one audit entry either way. The
//! [`PolicyAdministrationPoint`] audits every policy mutation, and the
//! [`BreakGlassManager`] grants short-lived supervised overrides when
//! routine policy would stand between a clinician and an emergency.

pub mod breakglass;
pub mod pap;
pub mod pep;

pub use breakglass::{
    ApprovalDecision, ApprovalHandle, Approver, ApproverVerdict, BreakGlassError,
    BreakGlassManager, BreakGlassSession, ChannelApprover, DEFAULT_APPROVAL_TIMEOUT,
    DEFAULT_OVERRIDE_WINDOW,
};
pub use pap::{PapError, PolicyAdministrationPoint};
pub use pep::{AuditFailurePolicy, EnforceError, EnforcementPoint};
