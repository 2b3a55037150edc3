//! Append-only audit trail for access decisions.
//!
//! Every decision the engine makes — permit or deny, routine or emergency —
//! lands here as one immutable [`AuditEntry`]. The [`AuditLog`] serializes
//! appends so entries are totally ordered, answers [`AuditQuery`] filters in
//! that order, and optionally mirrors each entry to a durable [`AuditSink`]
//! (one JSON line per decision).
//!
//! Entries are never mutated or deleted; compliance review depends on the
//! trail being a faithful record of what the engine actually decided.
//!
//! # Example
//!
//! ```
//! use medigate_audit::{AuditEntry, AuditLog, AuditQuery};
//! use medigate_types::{Outcome, ResourceId};
//!
//! let log = AuditLog::in_memory();
//! log.append(AuditEntry::new(
//!     "u-1",
//!     "Dr. Reyes",
//!     Some(ResourceId::new(42)),
//!     "read",
//!     Outcome::Permit,
//!     "policy evaluation passed",
//! ))?;
//!
//! let permits = log.query(&AuditQuery::new().outcome(Outcome::Permit));
//! assert_eq!(permits.len(), 1);
//! # Ok::<(), medigate_audit::AuditError>(())
//! ```

pub mod entry;
pub mod log;
pub mod query;
pub mod sink;

pub use entry::AuditEntry;
pub use log::{AuditError, AuditLog};
pub use query::AuditQuery;
pub use sink::{AuditSink, FileSink};
