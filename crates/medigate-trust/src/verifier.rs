//! Point-in-time trust verification.
//!
//! A pure check of the presented request context against the user's current
//! attribute snapshot. The checks run in a fixed order and the first failure
//! wins, so a caller always gets the same reason for the same state.

use medigate_types::UserSnapshot;

/// Why a trust check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustFailure {
    /// The user is not on an active shift.
    NotOnShift,
    /// The presented device is not the user's registered device.
    UnrecognizedDevice,
    /// The presented location is not the user's known location.
    UnrecognizedLocation,
}

impl TrustFailure {
    /// The denial reason recorded in the audit trail.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NotOnShift => "user not on active shift",
            Self::UnrecognizedDevice => "unrecognized device",
            Self::UnrecognizedLocation => "unrecognized location",
        }
    }
}

/// Outcome of a trust check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustCheck {
    /// All checks passed; the request may proceed to policy evaluation.
    Pass,
    /// The first failing check.
    Fail(TrustFailure),
}

impl TrustCheck {
    /// Whether every check passed.
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Verifies the presented request context against the user's snapshot.
///
/// Checks run shift → device → location and short-circuit on the first
/// failure. Pure: no logging, no side effects. The caller audits the outcome.
pub fn verify(user: &UserSnapshot, device_id: &str, location: &str) -> TrustCheck {
    if !user.active_shift {
        return TrustCheck::Fail(TrustFailure::NotOnShift);
    }
    if user.last_device_id != device_id {
        return TrustCheck::Fail(TrustFailure::UnrecognizedDevice);
    }
    if user.last_known_location != location {
        return TrustCheck::Fail(TrustFailure::UnrecognizedLocation);
    }
    TrustCheck::Pass
}

// ============================================================================
// Tests
// ============================================================================
