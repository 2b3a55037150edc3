//! Audit-trail filters.

use chrono::{DateTime, Utc};

use medigate_types::{Outcome, UserId};

use crate::entry::AuditEntry;

/// Builder-style filter over the audit trail.
///
/// An empty query matches every entry. Filters are conjunctive; results are
/// always returned in append order, so re-running a query after more appends
/// extends the previous result rather than reshuffling it.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    user: Option<UserId>,
    outcome: Option<Outcome>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    limit: Option<usize>,
}

impl AuditQuery {
    /// A query matching every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to entries for this user.
    #[must_use]
    pub fn user(mut self, user: impl Into<UserId>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Restricts to entries with this outcome.
    #[must_use]
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Restricts to entries at or after this instant.
    #[must_use]
    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    /// Restricts to entries strictly before this instant.
    #[must_use]
    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    /// Caps the result at the first `limit` matches (in append order).
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether this entry passes every configured filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(user) = &self.user {
            if entry.user != *user {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if entry.outcome != outcome {
                return false;
            }
        }
        if let Some(after) = self.after {
            if entry.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if entry.timestamp >= before {
                return false;
            }
        }
        true
    }

    pub(crate) fn max_results(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================
