//! The append-only log.

use std::io;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::error;

use crate::entry::AuditEntry;
use crate::query::AuditQuery;
use crate::sink::AuditSink;

/// Error type for audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The durable sink rejected the entry; it was not recorded anywhere.
    #[error("audit sink write failed: {0}")]
    Sink(#[from] io::Error),

    /// Entries could not be rendered for export.
    #[error("audit export failed: {0}")]
    Export(#[from] serde_json::Error),
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// The append-only, totally-ordered audit trail.
///
/// A single mutex serializes appends, so the in-memory order is the order
/// decisions were recorded. When a durable sink is attached, the sink write
/// happens first: an entry is either in both places or in neither, and a
/// sink failure surfaces to the caller instead of silently dropping the
/// durable copy.
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    sink: Option<Box<dyn AuditSink>>,
}

impl AuditLog {
    /// Creates a log with no durable sink.
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sink: None,
        }
    }

    /// Creates a log mirroring every entry to `sink`.
    pub fn with_sink(sink: Box<dyn AuditSink>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            sink: Some(sink),
        }
    }

    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Sink`] when the durable sink rejects the entry;
    /// the in-memory trail is left untouched in that case.
    pub fn append(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(sink) = &self.sink {
            if let Err(err) = sink.write(&entry) {
                error!(user = %entry.user, action = %entry.action, %err, "audit sink write failed");
                return Err(AuditError::Sink(err));
            }
        }

        entries.push(entry);
        Ok(())
    }

    /// Returns matching entries in append order.
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| query.matches(entry))
            .take(query.max_results())
            .cloned()
            .collect()
    }

    /// Entries recorded at or after `since`, in append order.
    pub fn entries_since(&self, since: DateTime<Utc>) -> Vec<AuditEntry> {
        self.query(&AuditQuery::new().after(since))
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exports the whole trail as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Export`] when serialization fails.
    pub fn export_json(&self) -> Result<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(serde_json::to_string_pretty(&*entries)?)
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("entries", &self.len())
            .field("durable", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::FileSink;
    use medigate_types::{Outcome, ResourceId, UserId};
    use std::sync::Arc;
    use std::thread;

    fn entry(user: &str, outcome: Outcome, reason: &str) -> AuditEntry {
        AuditEntry::new(
            user,
            "Test User",
            Some(ResourceId::new(1)),
            "read",
            outcome,
            reason,
        )
    }

    #[test]
    fn query_returns_entries_in_append_order() {
        let log = AuditLog::in_memory();
        for i in 0..5 {
            log.append(entry(&format!("u-{i}"), Outcome::Permit, "ok"))
                .expect("append");
        }

        let users: Vec<UserId> = log
            .query(&AuditQuery::new())
            .into_iter()
            .map(|e| e.user)
            .collect();
        let expected: Vec<UserId> = (0..5).map(|i| UserId::from(format!("u-{i}"))).collect();
        assert_eq!(users, expected);
    }

    #[test]
    fn limit_takes_the_earliest_matches() {
        let log = AuditLog::in_memory();
        for i in 0..5 {
            log.append(entry(&format!("u-{i}"), Outcome::Deny, "no"))
                .expect("append");
        }

        let first_two = log.query(&AuditQuery::new().limit(2));
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0].user, UserId::from("u-0"));
        assert_eq!(first_two[1].user, UserId::from("u-1"));
    }

    #[test]
    fn query_is_restartable_across_appends() {
        let log = AuditLog::in_memory();
        let query = AuditQuery::new().outcome(Outcome::Deny);

        log.append(entry("u-1", Outcome::Deny, "no")).expect("append");
        let before = log.query(&query);

        log.append(entry("u-2", Outcome::Deny, "no")).expect("append");
        let after = log.query(&query);

        // Earlier results are a prefix of later ones.
        assert_eq!(after[..before.len()], before[..]);
        assert_eq!(after.len(), before.len() + 1);
    }

    #[test]
    fn concurrent_appends_all_land() {
        let log = Arc::new(AuditLog::in_memory());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        log.append(entry(&format!("u-{t}-{i}"), Outcome::Permit, "ok"))
                            .expect("append");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        assert_eq!(log.len(), 200);
    }

    #[test]
    fn sink_failure_keeps_memory_and_file_consistent() {
        struct FailingSink;
        impl AuditSink for FailingSink {
            fn write(&self, _: &AuditEntry) -> io::Result<()> {
                Err(io::Error::other("disk full"))
            }
        }

        let log = AuditLog::with_sink(Box::new(FailingSink));
        let result = log.append(entry("u-1", Outcome::Permit, "ok"));

        assert!(matches!(result, Err(AuditError::Sink(_))));
        assert!(log.is_empty());
    }

    #[test]
    fn durable_log_mirrors_every_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("audit.log");
        let log = AuditLog::with_sink(Box::new(FileSink::open(&path).expect("open sink")));

        log.append(entry("u-1", Outcome::Permit, "ok")).expect("append");
        log.append(entry("u-2", Outcome::Deny, "no")).expect("append");

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn export_is_a_json_array() {
        let log = AuditLog::in_memory();
        log.append(entry("u-1", Outcome::Permit, "ok")).expect("append");

        let exported = log.export_json().expect("export");
        let value: serde_json::Value = serde_json::from_str(&exported).expect("valid json");
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }
}
