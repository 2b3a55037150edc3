//! A single audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use medigate_types::{Action, Outcome, ResourceId, UserId};

/// One immutable record of a decision the engine made.
///
/// The timestamp is assigned at construction, not at append, so the record
/// reflects when the decision was taken even if the log is briefly behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// When the decision was taken.
    pub timestamp: DateTime<Utc>,
    /// The requesting user.
    pub user: UserId,
    /// The user's display name at decision time.
    pub user_name: String,
    /// The record acted on; `None` for non-resource actions such as policy
    /// administration.
    pub resource: Option<ResourceId>,
    /// The requested action.
    pub action: Action,
    /// The decision outcome.
    pub outcome: Outcome,
    /// Why the decision came out the way it did.
    pub reason: String,
}

impl AuditEntry {
    /// Creates an entry stamped with a fresh id and the current time.
    pub fn new(
        user: impl Into<UserId>,
        user_name: impl Into<String>,
        resource: Option<ResourceId>,
        action: impl Into<Action>,
        outcome: Outcome,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user: user.into(),
            user_name: user_name.into(),
            resource,
            action: action.into(),
            outcome,
            reason: reason.into(),
        }
    }

    /// Renders the entry as one JSON line for the durable sink.
    ///
    /// Non-resource entries carry `"N/A"` in the resource field so every line
    /// has the same shape.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let resource = self
            .resource
            .map_or_else(|| "N/A".to_string(), |r| r.to_string());
        serde_json::to_string(&serde_json::json!({
            "user": self.user,
            "name": self.user_name,
            "resource": resource,
            "action": self.action,
            "decision": self.outcome.as_str(),
            "reason": self.reason,
            "timestamp": self.timestamp.to_rfc3339(),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_line_spells_out_missing_resource() {
        let entry = AuditEntry::new(
            "u-3",
            "A. Diaz",
            None,
            "add_policy",
            Outcome::Permit,
            "policy added",
        );

        let line = entry.to_json_line().expect("render line");
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["resource"], "N/A");
        assert_eq!(value["decision"], "PERMIT");
    }

    #[test]
    fn json_line_uses_numeric_resource_as_string() {
        let entry = AuditEntry::new(
            "u-1",
            "Dr. Reyes",
            Some(ResourceId::new(42)),
            "read",
            Outcome::Deny,
            "unrecognized device",
        );

        let value: serde_json::Value =
            serde_json::from_str(&entry.to_json_line().expect("render line")).expect("valid json");
        assert_eq!(value["resource"], "42");
        assert_eq!(value["decision"], "DENY");
        assert_eq!(value["reason"], "unrecognized device");
    }

    #[test]
    fn serde_round_trip() {
        let entry = AuditEntry::new(
            "u-1",
            "Dr. Reyes",
            Some(ResourceId::new(7)),
            "update",
            Outcome::Permit,
            "policy evaluation passed",
        );

        let json = serde_json::to_string(&entry).expect("serialize");
        let back: AuditEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, entry);
    }
}
