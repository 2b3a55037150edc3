//! Continuous zero-trust verification for access requests.
//!
//! Every request is re-verified against the requesting user's current
//! attributes before any policy is consulted:
//!
//! ```text
//!   request ──▶ AttributeStore ──▶ TrustVerifier ──▶ (policy evaluation)
//!                 │    TTL cache        │ shift → device → location
//!                 ▼                     ▼
//!           AttributeProvider      Pass / Fail(reason)
//! ```
//!
//! [`AttributeStore`] keeps short-lived snapshots of user attributes in front
//! of an [`AttributeProvider`] (the identity directory), so repeated requests
//! do not hammer the directory but stale attributes age out quickly.
//! [`verify`] then checks the presented device and location against the
//! snapshot, in a fixed short-circuit order.
//!
//! # Example
//!
//! ```
//! use medigate_trust::{verify, TrustCheck, TrustFailure};
//! use medigate_types::{Role, UserSnapshot};
//!
//! let user = UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor)
//!     .with_shift(true)
//!     .with_device("device123")
//!     .with_location("hospital_network");
//!
//! assert_eq!(verify(&user, "device123", "hospital_network"), TrustCheck::Pass);
//! assert_eq!(
//!     verify(&user, "device999", "hospital_network"),
//!     TrustCheck::Fail(TrustFailure::UnrecognizedDevice)
//! );
//! ```

pub mod provider;
pub mod store;
pub mod verifier;

pub use provider::{AttributeProvider, ProviderError, StaticDirectory};
pub use store::{AttributeStore, DEFAULT_ATTRIBUTE_TTL};
pub use verifier::{TrustCheck, TrustFailure, verify};
