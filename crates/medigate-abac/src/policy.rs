//! Policy definitions and the concurrently-mutable policy store.
//!
//! A [`Policy`] names the roles it applies to, the user attributes it
//! requires (all must match), and the actions it permits. The [`PolicyStore`]
//! keeps policies in declaration order behind an atomically-swapped immutable
//! set, so evaluation never observes a half-applied mutation.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use medigate_types::{Action, Role, UserSnapshot};

// ============================================================================
// Errors
// ============================================================================

/// Error type for policy store mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyStoreError {
    /// `remove` was called with a name no policy carries.
    #[error("policy not found: {0}")]
    PolicyNotFound(String),
}

/// Result type for policy store operations.
pub type Result<T> = std::result::Result<T, PolicyStoreError>;

// ============================================================================
// AttributeMatch
// ============================================================================

/// A required user attribute, compared for equality.
///
/// The comparison set is closed: every variant maps onto a concrete
/// [`UserSnapshot`] field, so evaluation is total and a policy can never
/// silently compare against an attribute that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMatch {
    /// The user's team label must equal this value.
    Team(String),
    /// The user's active-shift flag must equal this value.
    ActiveShift(bool),
}

impl AttributeMatch {
    /// Whether the user satisfies this requirement.
    pub fn matches(&self, user: &UserSnapshot) -> bool {
        match self {
            Self::Team(team) => user.team == *team,
            Self::ActiveShift(active) => user.active_shift == *active,
        }
    }
}

// ============================================================================
// Policy
// ============================================================================

/// A single named access policy.
///
/// A policy is *eligible* for a user when the user's role is in `roles` and
/// every entry of `required` matches (conjunctive). An eligible policy then
/// permits exactly the actions in `actions`.
///
/// A policy with an empty role set is eligible for nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Roles this policy applies to.
    pub roles: BTreeSet<Role>,
    /// Attribute requirements; all must match.
    pub required: Vec<AttributeMatch>,
    /// Actions permitted when this policy governs a request.
    pub actions: BTreeSet<Action>,
}

impl Policy {
    /// Creates a policy for the given roles with no attribute requirements
    /// and no permitted actions.
    pub fn for_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            required: Vec::new(),
            actions: BTreeSet::new(),
        }
    }

    /// Requires the user's team to equal `team` (builder pattern).
    #[must_use]
    pub fn require_team(mut self, team: impl Into<String>) -> Self {
        self.required.push(AttributeMatch::Team(team.into()));
        self
    }

    /// Requires the user's active-shift flag to equal `active`.
    #[must_use]
    pub fn require_active_shift(mut self, active: bool) -> Self {
        self.required.push(AttributeMatch::ActiveShift(active));
        self
    }

    /// Adds permitted actions.
    #[must_use]
    pub fn allow_actions<A: Into<Action>>(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    /// Whether this policy is eligible for the given user
    /// (role + all attribute requirements).
    pub fn eligible_for(&self, user: &UserSnapshot) -> bool {
        self.roles.contains(&user.role) && self.required.iter().all(|req| req.matches(user))
    }

    /// Whether this policy permits the given action.
    pub fn permits(&self, action: &Action) -> bool {
        self.actions.contains(action)
    }
}

// ============================================================================
// PolicySet
// ============================================================================

/// An immutable, declaration-ordered collection of named policies.
///
/// Produced by [`PolicyStore::snapshot`]; evaluation iterates it in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    entries: Vec<(String, Policy)>,
}

impl PolicySet {
    /// Builds a set from named policies, preserving iteration order.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Policy)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Iterates policies in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Policy)> {
        self.entries.iter().map(|(name, policy)| (name.as_str(), policy))
    }

    /// Looks up a policy by name.
    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    /// Number of policies in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// PolicyStore
// ============================================================================

/// Mutable, concurrently-accessed collection of named policies.
///
/// Writers build a new [`PolicySet`] and atomically publish it; readers take
/// cheap `Arc` snapshots. An in-flight evaluation therefore keeps the set it
/// started with and can never see a torn write.
///
/// The store performs no I/O and writes no audit entries — auditing policy
/// mutations is the administration point's job.
#[derive(Debug, Default)]
pub struct PolicyStore {
    current: RwLock<Arc<PolicySet>>,
}

impl PolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with the given policies, in order.
    pub fn with_policies(entries: impl IntoIterator<Item = (String, Policy)>) -> Self {
        Self {
            current: RwLock::new(Arc::new(PolicySet::from_entries(entries))),
        }
    }

    /// Inserts or replaces the policy named `name`.
    ///
    /// Always succeeds; returns the previous policy when one existed.
    /// Replacing keeps the policy's original declaration position, so the
    /// evaluation tie-break is stable across replacements.
    pub fn add(&self, name: impl Into<String>, policy: Policy) -> Option<Policy> {
        let name = name.into();
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut entries = guard.entries.clone();
        let previous = match entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, policy)),
            None => {
                entries.push((name.clone(), policy));
                None
            }
        };

        *guard = Arc::new(PolicySet { entries });
        debug!(policy = %name, replaced = previous.is_some(), "policy added");
        previous
    }

    /// Removes the policy named `name`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyStoreError::PolicyNotFound`] if no such policy exists;
    /// the store is left unchanged.
    pub fn remove(&self, name: &str) -> Result<Policy> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let position = guard
            .entries
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| PolicyStoreError::PolicyNotFound(name.to_string()))?;

        let mut entries = guard.entries.clone();
        let (_, removed) = entries.remove(position);

        *guard = Arc::new(PolicySet { entries });
        debug!(policy = %name, "policy removed");
        Ok(removed)
    }

    /// Returns a consistent read-only view of the current policies.
    pub fn snapshot(&self) -> Arc<PolicySet> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn read_only_policy() -> Policy {
        Policy::for_roles([Role::Nurse])
            .require_team("emergency")
            .allow_actions(["read"])
    }

    #[test]
    fn empty_role_set_matches_nothing() {
        let policy = Policy::for_roles([]).allow_actions(["read"]);
        let user = UserSnapshot::new("u", "U", Role::Admin).with_shift(true);
        assert!(!policy.eligible_for(&user));
    }

    #[test]
    fn attribute_requirements_are_conjunctive() {
        let policy = Policy::for_roles([Role::Doctor])
            .require_team("emergency")
            .require_active_shift(true);

        let on_shift_wrong_team = UserSnapshot::new("u", "U", Role::Doctor)
            .with_shift(true)
            .with_team("surgery");
        assert!(!policy.eligible_for(&on_shift_wrong_team));

        let right_team_off_shift = UserSnapshot::new("u", "U", Role::Doctor)
            .with_shift(false)
            .with_team("emergency");
        assert!(!policy.eligible_for(&right_team_off_shift));

        let both = UserSnapshot::new("u", "U", Role::Doctor)
            .with_shift(true)
            .with_team("emergency");
        assert!(policy.eligible_for(&both));
    }

    #[test]
    fn add_returns_previous_policy() {
        let store = PolicyStore::new();
        assert!(store.add("p", read_only_policy()).is_none());

        let wider = read_only_policy().allow_actions(["update"]);
        let previous = store.add("p", wider).expect("previous policy");
        assert_eq!(previous, read_only_policy());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn replace_keeps_declaration_position() {
        let store = PolicyStore::new();
        store.add("first", read_only_policy());
        store.add("second", read_only_policy());

        store.add("first", read_only_policy().allow_actions(["update"]));

        let names: Vec<String> = store
            .snapshot()
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn remove_unknown_name_fails() {
        let store = PolicyStore::new();
        assert_eq!(
            store.remove("ghost"),
            Err(PolicyStoreError::PolicyNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn add_then_remove_round_trips() {
        let store = PolicyStore::new();
        let before = store.snapshot();

        store.add("p", read_only_policy());
        let removed = store.remove("p").expect("policy exists");
        assert_eq!(removed, read_only_policy());

        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let store = PolicyStore::new();
        store.add("p", read_only_policy());

        let snapshot = store.snapshot();
        store.remove("p").expect("policy exists");

        // The earlier snapshot still sees the policy.
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("p").is_some());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn policy_serde_round_trip() {
        let policy = Policy::for_roles([Role::Doctor, Role::Surgeon])
            .require_team("surgery")
            .require_active_shift(true)
            .allow_actions(["read", "perform_surgery"]);

        let json = serde_json::to_string(&policy).expect("serialize policy");
        let back: Policy = serde_json::from_str(&json).expect("deserialize policy");
        assert_eq!(back, policy);
    }

    #[test]
    fn concurrent_snapshots_never_torn() {
        use std::thread;

        let store = Arc::new(PolicyStore::new());
        store.add("base", read_only_policy());

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..200 {
                    store.add(format!("p{i}"), read_only_policy());
                    if i % 2 == 0 {
                        let _ = store.remove(&format!("p{i}"));
                    }
                }
            })
        };

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = store.snapshot();
                    // Every observed set is internally consistent: the base
                    // policy is always present and lookups agree with iteration.
                    assert!(snapshot.get("base").is_some());
                    assert_eq!(snapshot.iter().count(), snapshot.len());
                }
            })
        };

        writer.join().expect("writer thread");
        reader.join().expect("reader thread");
    }
}
