//! # medigate-abac: Attribute-Based Access Control
//!
//! Policy storage (PAP-facing), and pure policy evaluation (PDP) for the
//! Medigate decision engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Access Request                              │
//! │  (UserSnapshot + Action)                     │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  PolicyStore.snapshot()                      │
//! │  └─ immutable policy set, declaration order  │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Evaluator                                   │
//! │  ├─ first policy whose roles + attributes    │
//! │  │  match the user governs the request       │
//! │  └─ that policy's action set decides         │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Evaluation                                  │
//! │  - Outcome (Permit/Deny)                     │
//! │  - Matched policy name                       │
//! │  - Human-readable reason                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Evaluation order
//!
//! Policies are consulted in declaration order and the **first** policy whose
//! role set and attribute requirements match the user governs the request,
//! even when its action set would deny an action a later policy permits.
//! Changing this to most-specific-wins is a product decision; the current
//! semantics are locked in by tests.
//!
//! ## Example
//!
//! ```
//! use medigate_abac::policy::{Policy, PolicyStore};
//! use medigate_abac::evaluator;
//! use medigate_types::{Action, Outcome, Role, UserSnapshot};
//!
//! let store = PolicyStore::new();
//! store.add(
//!     "doctor_policy",
//!     Policy::for_roles([Role::Doctor])
//!         .require_team("emergency")
//!         .allow_actions(["read", "update"]),
//! );
//!
//! let user = UserSnapshot::new("u-1", "Dr. Reyes", Role::Doctor)
//!     .with_shift(true)
//!     .with_team("emergency");
//!
//! let eval = evaluator::evaluate(&store.snapshot(), &user, &Action::new("read"));
//! assert_eq!(eval.outcome, Outcome::Permit);
//! ```

pub mod catalog;
pub mod definition;
pub mod evaluator;
pub mod policy;

pub use catalog::StandardPolicies;
pub use definition::{DefinitionError, parse_policy_document};
pub use evaluator::{Evaluation, evaluate};
pub use policy::{AttributeMatch, Policy, PolicySet, PolicyStore, PolicyStoreError};
