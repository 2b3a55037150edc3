//! Supervised break-glass emergency override.
//!
//! When routine policy would stand between a clinician and an emergency,
//! a second person can approve a short-lived override. The approval wait is
//! bounded, every request lands in the audit trail whatever its outcome, and
//! a granted session expires on a fixed window with no extension.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use medigate_audit::{AuditEntry, AuditError, AuditLog, AuditQuery};
use medigate_types::{Decision, Resource, ResourceId, UserId, UserSnapshot};

/// How long a granted override stays valid: 10 minutes, fixed.
pub const DEFAULT_OVERRIDE_WINDOW: Duration = Duration::from_secs(600);

/// How long a request waits for a supervisor: 30 seconds.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for break-glass requests.
#[derive(Debug, Error)]
pub enum BreakGlassError {
    /// The request outcome could not be audited; no session was created.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

/// Result type for break-glass requests.
pub type Result<T> = std::result::Result<T, BreakGlassError>;

// ============================================================================
// Approver seam
// ============================================================================

/// A supervisor's answer to an override request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproverVerdict {
    /// The named supervisor confirmed the override.
    Confirmed {
        /// Who approved.
        approver: String,
    },
    /// The supervisor refused.
    Denied,
    /// No answer arrived within the timeout.
    TimedOut,
}

/// Seam between the manager and whatever carries the approval.
///
/// `decide` must return within roughly `timeout`; the manager never waits
/// unboundedly for a human.
pub trait Approver {
    /// Asks for a verdict on the given request, waiting at most `timeout`.
    fn decide(&self, user: &UserSnapshot, resource: &Resource, timeout: Duration)
    -> ApproverVerdict;
}

/// What a supervisor sends down the approval channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    /// Approve, signed by the named supervisor.
    Approved {
        /// Who approved.
        approver: String,
    },
    /// Refuse.
    Denied,
}

/// The supervisor's end of an approval channel.
#[derive(Debug, Clone)]
pub struct ApprovalHandle {
    tx: mpsc::Sender<ApprovalDecision>,
}

impl ApprovalHandle {
    /// Approves the pending request in the given supervisor's name.
    pub fn approve(&self, approver: impl Into<String>) {
        let _ = self.tx.send(ApprovalDecision::Approved {
            approver: approver.into(),
        });
    }

    /// Refuses the pending request.
    pub fn deny(&self) {
        let _ = self.tx.send(ApprovalDecision::Denied);
    }
}

/// Channel-backed [`Approver`]: the manager blocks on `recv_timeout` while a
/// supervisor answers from another thread through the [`ApprovalHandle`].
///
/// A dropped handle counts as a refusal; only silence counts as a timeout.
#[derive(Debug)]
pub struct ChannelApprover {
    rx: Mutex<mpsc::Receiver<ApprovalDecision>>,
}

impl ChannelApprover {
    /// Creates a connected handle/approver pair.
    pub fn channel() -> (ApprovalHandle, Self) {
        let (tx, rx) = mpsc::channel();
        (ApprovalHandle { tx }, Self { rx: Mutex::new(rx) })
    }
}

impl Approver for ChannelApprover {
    fn decide(&self, _: &UserSnapshot, _: &Resource, timeout: Duration) -> ApproverVerdict {
        let rx = self.rx.lock().unwrap_or_else(PoisonError::into_inner);
        match rx.recv_timeout(timeout) {
            Ok(ApprovalDecision::Approved { approver }) => ApproverVerdict::Confirmed { approver },
            Ok(ApprovalDecision::Denied) | Err(RecvTimeoutError::Disconnected) => {
                ApproverVerdict::Denied
            }
            Err(RecvTimeoutError::Timeout) => ApproverVerdict::TimedOut,
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// One break-glass request and its outcome, retained forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakGlassSession {
    /// The requesting user.
    pub user: UserId,
    /// The user's display name at request time.
    pub user_name: String,
    /// The record the override targets.
    pub resource: ResourceId,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
    /// When the override stops being valid. Equal to `requested_at` for
    /// refused requests.
    pub expires_at: DateTime<Utc>,
    /// The approving supervisor, when the request was granted.
    pub approver: Option<String>,
    /// Whether the override was granted.
    pub granted: bool,
}

impl BreakGlassSession {
    /// Whether this session authorizes access at `now`.
    ///
    /// The expiry instant itself is outside the window.
    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        self.granted && now >= self.requested_at && now < self.expires_at
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Grants and tracks supervised emergency overrides.
///
/// Sessions are never evicted: an expired session stops authorizing access
/// but stays available to compliance review via [`Self::sessions`].
pub struct BreakGlassManager {
    audit: Arc<AuditLog>,
    sessions: Mutex<Vec<BreakGlassSession>>,
    window: Duration,
    approval_timeout: Duration,
}

impl BreakGlassManager {
    /// Creates a manager with the default 10-minute window and 30-second
    /// approval timeout.
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self {
            audit,
            sessions: Mutex::new(Vec::new()),
            window: DEFAULT_OVERRIDE_WINDOW,
            approval_timeout: DEFAULT_APPROVAL_TIMEOUT,
        }
    }

    /// Overrides the session window.
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Overrides the approval timeout.
    #[must_use]
    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    /// Requests an emergency override for `user` on `resource`.
    ///
    /// Without an approver the request is refused outright; there is no
    /// unsupervised path. With one, the verdict is awaited for at most the
    /// approval timeout. Every outcome is audited before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BreakGlassError::Audit`] when the outcome cannot be
    /// recorded; no session is created in that case.
    pub fn request(
        &self,
        user: &UserSnapshot,
        resource: &Resource,
        approver: Option<&dyn Approver>,
    ) -> Result<Decision> {
        let verdict = match approver {
            None => ApproverVerdict::Denied,
            Some(approver) => approver.decide(user, resource, self.approval_timeout),
        };

        let requested_at = Utc::now();
        let (session, decision) = match verdict {
            ApproverVerdict::Confirmed { approver } => {
                let expires_at = requested_at
                    .checked_add_signed(
                        chrono::Duration::from_std(self.window)
                            .unwrap_or(chrono::Duration::MAX),
                    )
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                info!(
                    user = %user.id,
                    resource = %resource.id,
                    approver = %approver,
                    %expires_at,
                    "emergency override granted"
                );
                (
                    BreakGlassSession {
                        user: user.id.clone(),
                        user_name: user.name.clone(),
                        resource: resource.id,
                        requested_at,
                        expires_at,
                        approver: Some(approver),
                        granted: true,
                    },
                    Decision::permit("time-bound emergency override", Some(resource.id)),
                )
            }
            ApproverVerdict::Denied => {
                warn!(user = %user.id, resource = %resource.id, "emergency override refused");
                (
                    self.refused_session(user, resource, requested_at),
                    Decision::deny("authorization denied", Some(resource.id)),
                )
            }
            ApproverVerdict::TimedOut => {
                warn!(user = %user.id, resource = %resource.id, "emergency override timed out");
                (
                    self.refused_session(user, resource, requested_at),
                    Decision::deny("approval timeout", Some(resource.id)),
                )
            }
        };

        self.audit.append(AuditEntry::new(
            user.id.clone(),
            user.name.clone(),
            Some(resource.id),
            "break_glass",
            decision.outcome,
            decision.reason.clone(),
        ))?;

        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(session);
        Ok(decision)
    }

    fn refused_session(
        &self,
        user: &UserSnapshot,
        resource: &Resource,
        requested_at: DateTime<Utc>,
    ) -> BreakGlassSession {
        BreakGlassSession {
            user: user.id.clone(),
            user_name: user.name.clone(),
            resource: resource.id,
            requested_at,
            expires_at: requested_at,
            approver: None,
            granted: false,
        }
    }

    /// Whether `user` holds an unexpired override on `resource` at `now`.
    pub fn session_active(&self, user: &UserId, resource: ResourceId, now: DateTime<Utc>) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|s| s.user == *user && s.resource == resource && s.active_at(now))
    }

    /// Every request and its outcome, granted and refused alike, in request
    /// order.
    pub fn sessions(&self) -> Vec<BreakGlassSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The complete audit trail, not filtered to break-glass events.
    ///
    /// Emergency overrides are reviewed in context: the trail returned here
    /// includes the routine decisions and policy mutations that surround
    /// each override, in append order.
    pub fn audit_sessions(&self) -> Vec<AuditEntry> {
        self.audit.query(&AuditQuery::new())
    }
}

impl std::fmt::Debug for BreakGlassManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakGlassManager")
            .field("window", &self.window)
            .field("approval_timeout", &self.approval_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
