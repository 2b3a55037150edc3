//! TTL-cached attribute store.
//!
//! Sits between the enforcement point and the [`AttributeProvider`]: reads
//! within the TTL are served from cache, expired reads force a refresh before
//! returning. Concurrent refreshes for the same user coalesce into a single
//! provider fetch; unrelated users never block each other.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use medigate_types::{UserId, UserSnapshot};

use crate::provider::{AttributeProvider, Result};

/// Default snapshot lifetime: 300 seconds.
pub const DEFAULT_ATTRIBUTE_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    snapshot: UserSnapshot,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<UserId, CacheEntry>,
    /// Users with a refresh currently running on some thread.
    in_flight: HashSet<UserId>,
}

/// Caching front for an [`AttributeProvider`].
///
/// A snapshot older than the TTL is never returned; the read that observes
/// expiry re-fetches synchronously. Fetch failures are surfaced to the caller
/// unchanged and nothing is cached for them, so there is no implicit retry
/// and no negative caching.
pub struct AttributeStore {
    provider: Box<dyn AttributeProvider>,
    ttl: Duration,
    state: Mutex<CacheState>,
    refreshed: Condvar,
}

impl AttributeStore {
    /// Creates a store with the default 300-second TTL.
    pub fn new(provider: Box<dyn AttributeProvider>) -> Self {
        Self::with_ttl(provider, DEFAULT_ATTRIBUTE_TTL)
    }

    /// Creates a store with an explicit TTL.
    pub fn with_ttl(provider: Box<dyn AttributeProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            state: Mutex::new(CacheState::default()),
            refreshed: Condvar::new(),
        }
    }

    /// Returns a snapshot no older than the TTL, fetching when necessary.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error when a required fetch fails.
    pub fn get(&self, id: &UserId) -> Result<UserSnapshot> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if let Some(entry) = state.entries.get(id) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.snapshot.clone());
                }
            }

            if state.in_flight.contains(id) {
                // Another thread is refreshing this user; wait for it and
                // re-check rather than issuing a duplicate fetch.
                state = self
                    .refreshed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            state.in_flight.insert(id.clone());
            drop(state);

            debug!(user = %id, "refreshing attribute snapshot");
            let fetched = self.provider.fetch_user(id);

            state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight.remove(id);

            let result = match fetched {
                Ok(snapshot) => {
                    state.entries.insert(
                        id.clone(),
                        CacheEntry {
                            snapshot: snapshot.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                    Ok(snapshot)
                }
                Err(err) => Err(err),
            };

            // Wake waiters either way; on error they retry the fetch
            // themselves rather than inheriting this thread's failure.
            self.refreshed.notify_all();
            return result;
        }
    }

    /// Drops the cached snapshot for `id`; the next read re-fetches.
    pub fn invalidate(&self, id: &UserId) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(id);
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use medigate_types::Role;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Provider that counts fetches and can be made slow.
    struct CountingProvider {
        fetches: AtomicUsize,
        delay: Duration,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                delay,
            }
        }

        fn count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl AttributeProvider for CountingProvider {
        fn fetch_user(&self, id: &UserId) -> Result<UserSnapshot> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            if id.as_str() == "ghost" {
                return Err(ProviderError::UserNotFound(id.clone()));
            }
            Ok(UserSnapshot::new(id.clone(), "Test User", Role::Nurse).with_shift(true))
        }
    }

    // Shares the counter with the store, which owns the provider box.
    struct SharedProvider(Arc<CountingProvider>);

    impl AttributeProvider for SharedProvider {
        fn fetch_user(&self, id: &UserId) -> Result<UserSnapshot> {
            self.0.fetch_user(id)
        }
    }

    fn store_with(provider: Arc<CountingProvider>, ttl: Duration) -> AttributeStore {
        AttributeStore::with_ttl(Box::new(SharedProvider(provider)), ttl)
    }

    #[test]
    fn fresh_reads_hit_the_cache() {
        let provider = Arc::new(CountingProvider::new());
        let store = store_with(Arc::clone(&provider), Duration::from_secs(300));
        let id = UserId::from("u-1");

        store.get(&id).expect("first read");
        store.get(&id).expect("second read");
        store.get(&id).expect("third read");

        assert_eq!(provider.count(), 1);
    }

    #[test]
    fn expired_read_forces_refresh() {
        let provider = Arc::new(CountingProvider::new());
        let store = store_with(Arc::clone(&provider), Duration::from_millis(10));
        let id = UserId::from("u-1");

        store.get(&id).expect("first read");
        thread::sleep(Duration::from_millis(20));
        store.get(&id).expect("read after expiry");

        assert_eq!(provider.count(), 2);
    }

    #[test]
    fn invalidate_drops_the_entry() {
        let provider = Arc::new(CountingProvider::new());
        let store = store_with(Arc::clone(&provider), Duration::from_secs(300));
        let id = UserId::from("u-1");

        store.get(&id).expect("first read");
        store.invalidate(&id);
        store.get(&id).expect("read after invalidate");

        assert_eq!(provider.count(), 2);
    }

    #[test]
    fn fetch_failure_propagates_and_is_not_cached() {
        let provider = Arc::new(CountingProvider::new());
        let store = store_with(Arc::clone(&provider), Duration::from_secs(300));
        let id = UserId::from("ghost");

        assert_eq!(
            store.get(&id),
            Err(ProviderError::UserNotFound(id.clone()))
        );
        assert_eq!(
            store.get(&id),
            Err(ProviderError::UserNotFound(id.clone()))
        );

        // No negative caching: each failed read went to the provider.
        assert_eq!(provider.count(), 2);
    }

    #[test]
    fn concurrent_reads_of_one_user_coalesce() {
        let provider = Arc::new(CountingProvider::slow(Duration::from_millis(50)));
        let store = Arc::new(store_with(Arc::clone(&provider), Duration::from_secs(300)));
        let id = UserId::from("u-1");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let id = id.clone();
                thread::spawn(move || store.get(&id).expect("read"))
            })
            .collect();
        for handle in handles {
            handle.join().expect("reader thread");
        }

        assert_eq!(provider.count(), 1);
    }

    #[test]
    fn distinct_users_do_not_block_each_other() {
        let provider = Arc::new(CountingProvider::slow(Duration::from_millis(30)));
        let store = Arc::new(store_with(Arc::clone(&provider), Duration::from_secs(300)));

        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.get(&UserId::from(format!("u-{i}"))).expect("read"))
            })
            .collect();
        for handle in handles {
            handle.join().expect("reader thread");
        }

        // Four serialized fetches would take >= 120 ms.
        assert!(start.elapsed() < Duration::from_millis(110));
        assert_eq!(provider.count(), 4);
    }
}
