//! Access-control decision engine for sensitive medical records.
//!
//! Medigate combines three layers into one decision path:
//!
//! 1. **Continuous zero-trust verification** — every request re-checks the
//!    user's shift, device, and location before any policy is read.
//! 2. **Attribute-based policies** — named, ordered policies evaluated
//!    first-eligible-wins; the governing policy either permits the action or
//!    denies it outright.
//! 3. **Supervised break-glass override** — a second person can approve a
//!    fixed 10-minute emergency session when routine policy would block
//!    life-critical access.
//!
//! Every decision, from routine reads to emergency overrides and policy
//! edits, lands in an append-only audit trail.
//!
//! [`AccessEngine`] wires the layers together from a [`MedigateConfig`]:
//!
//! ```
//! use medigate::{AccessEngine, Action, Resource, Role, StaticDirectory, UserSnapshot};
//!
//! let directory = StaticDirectory::with_users([
//!     UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor)
//!         .with_shift(true)
//!         .with_team("emergency")
//!         .with_device("device123")
//!         .with_location("hospital_network"),
//! ]);
//! let engine = AccessEngine::new(Box::new(directory));
//!
//! let record = Resource::new(42u64, "medical_record", "emergency");
//! let decision = engine
//!     .enforcement()
//!     .enforce_for(
//!         &"u-1".into(),
//!         &Action::new("update"),
//!         Some(&record),
//!         "device123",
//!         "hospital_network",
//!     )?;
//! assert!(decision.is_permit());
//! # Ok::<(), medigate::EnforceError>(())
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

pub mod catalog;

pub use catalog::standard_resources;
pub use medigate_abac::{
    AttributeMatch, DefinitionError, Evaluation, Policy, PolicySet, PolicyStore, PolicyStoreError,
    StandardPolicies, evaluate, parse_policy_document,
};
pub use medigate_audit::{AuditEntry, AuditError, AuditLog, AuditQuery, AuditSink, FileSink};
pub use medigate_config::{ConfigError, ConfigLoader, MedigateConfig, WriteFailurePolicy};
pub use medigate_enforce::{
    ApprovalHandle, Approver, ApproverVerdict, AuditFailurePolicy, BreakGlassError,
    BreakGlassManager, BreakGlassSession, ChannelApprover, EnforceError, EnforcementPoint,
    PapError, PolicyAdministrationPoint,
};
pub use medigate_trust::{
    AttributeProvider, AttributeStore, ProviderError, StaticDirectory, TrustCheck, TrustFailure,
    verify,
};
pub use medigate_types::{
    Action, Decision, Outcome, Resource, ResourceId, Role, UserId, UserSnapshot,
};

/// Error type for engine construction.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The durable audit log could not be opened.
    #[error("failed to open audit log: {0}")]
    AuditLog(#[from] io::Error),

    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The assembled engine: policy store, attribute cache, audit trail, and the
/// three decision surfaces wired over them.
///
/// Construct one per deployment and share it; every component is safe to call
/// from multiple threads.
pub struct AccessEngine {
    policies: Arc<PolicyStore>,
    attributes: Arc<AttributeStore>,
    audit: Arc<AuditLog>,
    enforcement: EnforcementPoint,
    administration: PolicyAdministrationPoint,
    break_glass: BreakGlassManager,
}

impl AccessEngine {
    /// Wires an engine with default configuration and the standard policy
    /// catalog, auditing in memory only.
    pub fn new(provider: Box<dyn AttributeProvider>) -> Self {
        Self::assemble(&MedigateConfig::default(), AuditLog::in_memory(), provider)
    }

    /// Wires an engine from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for an invalid configuration and
    /// [`EngineError::AuditLog`] when the durable log cannot be opened.
    pub fn with_config(
        config: &MedigateConfig,
        provider: Box<dyn AttributeProvider>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let audit = match (&config.audit.log_path, config.audit.durable) {
            (Some(path), true) => AuditLog::with_sink(Box::new(FileSink::open(path)?)),
            _ => AuditLog::in_memory(),
        };

        Ok(Self::assemble(config, audit, provider))
    }

    fn assemble(
        config: &MedigateConfig,
        audit: AuditLog,
        provider: Box<dyn AttributeProvider>,
    ) -> Self {
        let audit = Arc::new(audit);
        let policies = Arc::new(PolicyStore::with_policies(StandardPolicies::catalog()));
        let attributes = Arc::new(AttributeStore::with_ttl(
            provider,
            Duration::from_secs(config.attributes.ttl_secs),
        ));

        let on_audit_failure = match config.audit.on_write_failure {
            WriteFailurePolicy::FailClosed => AuditFailurePolicy::FailClosed,
            WriteFailurePolicy::FailOpen => AuditFailurePolicy::FailOpen,
        };

        let enforcement = EnforcementPoint::new(
            Arc::clone(&policies),
            Arc::clone(&attributes),
            Arc::clone(&audit),
        )
        .with_audit_failure_policy(on_audit_failure);

        let administration =
            PolicyAdministrationPoint::new(Arc::clone(&policies), Arc::clone(&audit));

        let break_glass = BreakGlassManager::new(Arc::clone(&audit))
            .with_window(Duration::from_secs(config.break_glass.window_secs))
            .with_approval_timeout(Duration::from_secs(
                config.break_glass.approval_timeout_secs,
            ));

        info!(
            ttl_secs = config.attributes.ttl_secs,
            window_secs = config.break_glass.window_secs,
            durable_audit = config.audit.durable,
            "access engine wired"
        );

        Self {
            policies,
            attributes,
            audit,
            enforcement,
            administration,
            break_glass,
        }
    }

    /// The routine-request front door.
    pub fn enforcement(&self) -> &EnforcementPoint {
        &self.enforcement
    }

    /// The audited route for policy mutations.
    pub fn administration(&self) -> &PolicyAdministrationPoint {
        &self.administration
    }

    /// The supervised emergency-override surface.
    pub fn break_glass(&self) -> &BreakGlassManager {
        &self.break_glass
    }

    /// The audit trail shared by every surface.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The live policy store.
    pub fn policies(&self) -> &PolicyStore {
        &self.policies
    }

    /// Loads policies from a JSON policy document into the store.
    ///
    /// Parsed entries are added in declaration order; an entry whose name is
    /// already present replaces that policy in place. This path is unaudited;
    /// use [`Self::administration`] for governed mutations.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] for a malformed document; the store is
    /// left unchanged in that case.
    pub fn load_policy_document(&self, json: &str) -> Result<(), DefinitionError> {
        for (name, policy) in parse_policy_document(json)? {
            self.policies.add(name, policy);
        }
        Ok(())
    }

    /// The cached attribute store.
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }
}

impl std::fmt::Debug for AccessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessEngine")
            .field("policies", &self.policies.snapshot().len())
            .field("audit_entries", &self.audit.len())
            .finish_non_exhaustive()
    }
}
