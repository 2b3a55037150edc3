//! # medigate-types: Core types for Medigate
//!
//! Shared types used across the Medigate access-control engine:
//! - Entity IDs ([`UserId`], [`ResourceId`])
//! - The closed role set ([`Role`])
//! - Request vocabulary ([`Action`])
//! - Subject and object snapshots ([`UserSnapshot`], [`Resource`])
//! - Decision results ([`Outcome`], [`Decision`])

use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Entity IDs
// ============================================================================

/// Unique identifier for a user (subject of an access request).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for a protected resource (medical record, image set, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ResourceId> for u64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

// ============================================================================
// Role
// ============================================================================

/// Clinical role of a user.
///
/// The role set is closed: policies reference roles, and an unknown role
/// string is a configuration error, never a silent no-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Doctor,
    Nurse,
    Admin,
    Ambulance,
    Pharmacist,
    Receptionist,
    LabTechnician,
    BillingClerk,
    Surgeon,
    Anesthesiologist,
    Physician,
    XrayTechnician,
}

impl Role {
    /// The wire/config name of this role (matches the policy JSON format).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Admin => "admin",
            Self::Ambulance => "ambulance",
            Self::Pharmacist => "pharmacist",
            Self::Receptionist => "receptionist",
            Self::LabTechnician => "lab_technician",
            Self::BillingClerk => "billing_clerk",
            Self::Surgeon => "surgeon",
            Self::Anesthesiologist => "anesthesiologist",
            Self::Physician => "physician",
            Self::XrayTechnician => "xray_technician",
        }
    }

    /// Parses a role name as it appears in policy definitions.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "doctor" => Some(Self::Doctor),
            "nurse" => Some(Self::Nurse),
            "admin" => Some(Self::Admin),
            "ambulance" => Some(Self::Ambulance),
            "pharmacist" => Some(Self::Pharmacist),
            "receptionist" => Some(Self::Receptionist),
            "lab_technician" => Some(Self::LabTechnician),
            "billing_clerk" => Some(Self::BillingClerk),
            "surgeon" => Some(Self::Surgeon),
            "anesthesiologist" => Some(Self::Anesthesiologist),
            "physician" => Some(Self::Physician),
            "xray_technician" => Some(Self::XrayTechnician),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Action
// ============================================================================

/// An operation a user wants to perform on a resource.
///
/// The action vocabulary is open ("read", "update", "manage_images", ...);
/// policies enumerate the actions they permit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action(String);

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Action {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Action {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// UserSnapshot
// ============================================================================

/// A point-in-time view of a user's attributes.
///
/// Snapshots are produced by the attribute provider and cached with a TTL.
/// They are immutable once read: a refresh replaces the snapshot wholesale,
/// never field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name, carried into audit entries.
    pub name: String,
    /// Clinical role.
    pub role: Role,
    /// Whether the user is currently on an active shift.
    pub active_shift: bool,
    /// Team label (e.g. "emergency", "surgery").
    pub team: String,
    /// Device id from the user's last verified session.
    pub last_device_id: String,
    /// Location label from the user's last verified session.
    pub last_known_location: String,
}

impl UserSnapshot {
    /// Creates a snapshot with required identity fields and inactive defaults.
    ///
    /// Sets `active_shift` to `false` and leaves team/device/location empty;
    /// use the `with_*` builders to fill them in.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            active_shift: false,
            team: String::new(),
            last_device_id: String::new(),
            last_known_location: String::new(),
        }
    }

    /// Sets the active-shift flag.
    #[must_use]
    pub fn with_shift(mut self, active: bool) -> Self {
        self.active_shift = active;
        self
    }

    /// Sets the team label.
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    /// Sets the last verified device id.
    #[must_use]
    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.last_device_id = device_id.into();
        self
    }

    /// Sets the last verified location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.last_known_location = location.into();
        self
    }
}

// ============================================================================
// Resource
// ============================================================================

/// A protected resource. Read-only to the decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable resource identifier.
    pub id: ResourceId,
    /// Resource type label (e.g. "EMR", "Lab Results").
    pub kind: String,
    /// Owning team label.
    pub team: String,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, kind: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            team: team.into(),
        }
    }
}

// ============================================================================
// Outcome & Decision
// ============================================================================

/// The outcome of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Access granted.
    Permit,
    /// Access refused.
    Deny,
}

impl Default for Outcome {
    /// Defaults to `Deny` (safe default: deny unless explicitly permitted).
    fn default() -> Self {
        Self::Deny
    }
}

impl Outcome {
    /// The audit-trail spelling of this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permit => "PERMIT",
            Self::Deny => "DENY",
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An access decision, produced exactly once per request and written once
/// to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Permit or deny.
    pub outcome: Outcome,
    /// Human-readable reason for the outcome.
    pub reason: String,
    /// The resource under decision, if the request targeted one.
    pub resource: Option<ResourceId>,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Creates a PERMIT decision timestamped now.
    pub fn permit(reason: impl Into<String>, resource: Option<ResourceId>) -> Self {
        Self {
            outcome: Outcome::Permit,
            reason: reason.into(),
            resource,
            timestamp: Utc::now(),
        }
    }

    /// Creates a DENY decision timestamped now.
    pub fn deny(reason: impl Into<String>, resource: Option<ResourceId>) -> Self {
        Self {
            outcome: Outcome::Deny,
            reason: reason.into(),
            resource,
            timestamp: Utc::now(),
        }
    }

    /// Whether this decision grants access.
    pub fn is_permit(&self) -> bool {
        self.outcome == Outcome::Permit
    }
}

// ============================================================================
// Tests
// ============================================================================
