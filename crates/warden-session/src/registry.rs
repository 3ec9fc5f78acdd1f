//! Session registry: issuance, cache-aside validation, removal and
//! reconciliation against an external liveness signal.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::cache::{CacheStats, RecencyCache};
use crate::config::RegistryConfig;
use crate::error::{Error, Result, StoreError};
use crate::persistence::{MemoryStore, Session, SessionStore};
use crate::token::{RandomTokenGenerator, TokenGenerator};

/// Trim a username and reject it if nothing is left.
pub fn normalize_username(username: &str) -> Result<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("username must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Outcome of a [`SessionRegistry::reconcile`] run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Sessions the store confirmed as deleted.
    pub removed: usize,

    /// Sessions whose removal failed.
    pub failed: usize,

    /// The first failure encountered, if any.
    pub first_error: Option<Error>,
}

impl ReconcileReport {
    /// Whether every stale session was processed without error.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Recency cache occupancy.
    pub cache: CacheStats,

    /// Validations answered from the cache.
    pub cache_hits: u64,

    /// Validations answered by the store and backfilled into the cache.
    pub store_hits: u64,

    /// Validations that found no matching session.
    pub misses: u64,

    /// Validations that could not reach the store.
    pub store_errors: u64,
}

/// Recency cache plus a counter bumped by every removal.
///
/// Cache fills that follow a store read snapshot `removals` before the read
/// and are dropped if a removal landed in between.
#[derive(Debug)]
struct CacheState {
    cache: RecencyCache,
    removals: u64,
}

impl CacheState {
    fn new(capacity: usize) -> Self {
        Self {
            cache: RecencyCache::new(capacity),
            removals: 0,
        }
    }

    fn fill_since(&mut self, snapshot: u64, username: &str, token: &str) -> bool {
        if self.removals != snapshot {
            return false;
        }
        self.cache.add(username, token);
        true
    }

    fn evict(&mut self, username: &str) {
        self.cache.remove(username);
        self.removals = self.removals.wrapping_add(1);
    }
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    store_hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
}

/// Issues, validates and removes sessions.
///
/// The store is authoritative; the [`RecencyCache`] mirrors a bounded window
/// of it. The cache lock is never held across a store call: each operation
/// releases it before talking to the store and re-acquires it briefly to
/// apply the cache side effect. A removal that lands between a store read
/// and the matching cache fill cancels the fill.
///
/// Share one instance across request handlers behind an `Arc`.
pub struct SessionRegistry<S: SessionStore = MemoryStore> {
    store: S,
    cache: Mutex<CacheState>,
    generator: Box<dyn TokenGenerator>,
    counters: Counters,
    config: RegistryConfig,
}

impl SessionRegistry<MemoryStore> {
    /// Create a registry over an empty in-memory store.
    pub fn in_memory(config: RegistryConfig) -> Self {
        Self::new(config, MemoryStore::new())
    }
}

impl<S: SessionStore> SessionRegistry<S> {
    /// Create a registry over the given store.
    pub fn new(config: RegistryConfig, store: S) -> Self {
        Self {
            store,
            cache: Mutex::new(CacheState::new(config.cache_size)),
            generator: Box::new(RandomTokenGenerator),
            counters: Counters::default(),
            config,
        }
    }

    /// Replace the token generator.
    pub fn with_generator(mut self, generator: impl TokenGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Get the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Issue a session for a new username.
    ///
    /// Fails with [`Error::AlreadyExists`] without touching the store or cache
    /// when a row already exists. The existence check and the insert are two
    /// separate store calls, so two concurrent creates for the same name can
    /// both pass the check. Stores with a uniqueness constraint report the
    /// loser as [`StoreError::DuplicateUser`], which surfaces here as
    /// `AlreadyExists`; stores without one keep the last write.
    pub fn create_session(&self, username: &str) -> Result<Session> {
        let username = normalize_username(username)?;

        if self.store.get(&username)?.is_some() {
            debug!(username = %username, "Session already exists");
            return Err(Error::AlreadyExists(username));
        }

        let token = self.generator.generate();
        let snapshot = self.cache.lock().removals;
        match self.store.insert(&username, &token) {
            Ok(()) => {}
            Err(StoreError::DuplicateUser(_)) => {
                debug!(username = %username, "Lost create race to a concurrent insert");
                return Err(Error::AlreadyExists(username));
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to persist new session");
                return Err(e.into());
            }
        }

        if !self.cache.lock().fill_since(snapshot, &username, &token) {
            debug!(username = %username, "Session removed while being created, not caching");
        }
        info!(username = %username, "Session created");

        Ok(Session::new(username, token))
    }

    /// Check a `(username, token)` pair, surfacing store failures.
    ///
    /// Cache hits return without touching the store. On a miss the store is
    /// consulted and an exact match is backfilled into the cache. A hit does
    /// not move the entry to the most-recent position.
    pub fn try_validate(&self, username: &str, token: &str) -> Result<bool> {
        let Ok(username) = normalize_username(username) else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(false);
        };

        let (cached, snapshot) = {
            let state = self.cache.lock();
            (state.cache.check_valid(&username, token), state.removals)
        };
        if cached {
            trace!(username = %username, "Session validated from cache");
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(true);
        }

        match self.store.get(&username) {
            Ok(Some(session)) if session.token == token => {
                if self.cache.lock().fill_since(snapshot, &username, token) {
                    debug!(username = %username, "Session validated from store, cache backfilled");
                } else {
                    debug!(username = %username, "Session removed during validation, skipping backfill");
                }
                self.counters.store_hits.fetch_add(1, Ordering::Relaxed);
                Ok(true)
            }
            Ok(_) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                Ok(false)
            }
            Err(e) => {
                self.counters.store_errors.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }

    /// Check a `(username, token)` pair.
    ///
    /// Store failures are logged and reported as invalid.
    pub fn validate(&self, username: &str, token: &str) -> bool {
        match self.try_validate(username, token) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(
                    username = %username.trim(),
                    error = %e,
                    "Store unavailable during validation, treating session as invalid"
                );
                false
            }
        }
    }

    /// Remove a session from the store and evict it from the cache.
    ///
    /// The cache entry is dropped even when the store call fails. Returns
    /// whether the store had a row to delete.
    pub fn remove_session(&self, username: &str) -> Result<bool> {
        let username = normalize_username(username)?;
        self.remove_normalized(&username)
    }

    fn remove_normalized(&self, username: &str) -> Result<bool> {
        let result = self.store.delete(username);
        self.cache.lock().evict(username);

        match result {
            Ok(removed) => {
                if removed {
                    info!(username = %username, "Session removed");
                } else {
                    debug!(username = %username, "No stored session to remove");
                }
                Ok(removed)
            }
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to delete session from store");
                Err(e.into())
            }
        }
    }

    /// Remove every stored session whose username is not in `active`.
    ///
    /// Active usernames are trimmed like any other username; blank entries
    /// are ignored. An empty `active` set removes everything. Failure to list the store
    /// aborts the run; failures on individual users are counted and the run
    /// continues. Not atomic: sessions removed before a failure stay removed.
    pub fn reconcile(&self, active: &HashSet<String>) -> Result<ReconcileReport> {
        let active: HashSet<String> = active
            .iter()
            .filter_map(|name| normalize_username(name).ok())
            .collect();
        let stored = self.store.list_all()?;
        let mut report = ReconcileReport::default();

        for session in stored
            .into_iter()
            .filter(|s| !active.contains(&s.username))
        {
            match self.remove_normalized(&session.username) {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    if report.first_error.is_none() {
                        report.first_error = Some(e);
                    }
                }
            }
        }

        info!(
            removed = report.removed,
            failed = report.failed,
            active = active.len(),
            "Reconciled sessions against active set"
        );

        Ok(report)
    }

    /// Authoritative store read for one user.
    pub fn get_session(&self, username: &str) -> Result<Session> {
        let username = normalize_username(username)?;
        self.store.get(&username)?.ok_or(Error::NotFound(username))
    }

    /// Every stored session.
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.store.list_all()?)
    }

    /// Number of stored sessions, straight from the store.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.store.session_count()?)
    }

    /// Cached usernames, oldest first.
    pub fn cached_usernames(&self) -> Vec<String> {
        self.cache.lock().cache.usernames()
    }

    /// Get registry statistics.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            cache: self.cache.lock().cache.stats(),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            store_hits: self.counters.store_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            store_errors: self.counters.store_errors.load(Ordering::Relaxed),
        }
    }
}

impl<S: SessionStore> std::fmt::Debug for SessionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("config", &self.config)
            .field("cache", &self.cache.lock().cache.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::token::TOKEN_LENGTH;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::{Arc, Barrier};

    /// One-shot rendezvous that holds a store call after it has done its work.
    struct Gate {
        armed: AtomicBool,
        barrier: Barrier,
    }

    impl Gate {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                armed: AtomicBool::new(true),
                barrier: Barrier::new(2),
            })
        }

        /// Called from inside the store; blocks until `release` on first use.
        fn hold(&self) {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.barrier.wait();
                self.barrier.wait();
            }
        }

        fn wait_held(&self) {
            self.barrier.wait();
        }

        fn release(&self) {
            self.barrier.wait();
        }
    }

    /// Store wrapper that counts reads and can be told to fail.
    #[derive(Default)]
    struct TestStore {
        inner: MemoryStore,
        gets: AtomicUsize,
        unavailable: AtomicBool,
        unique: bool,
        hide_rows: bool,
        failing_deletes: parking_lot::Mutex<HashSet<String>>,
        hold_get: Option<Arc<Gate>>,
        hold_insert: Option<Arc<Gate>>,
    }

    impl TestStore {
        fn unique() -> Self {
            Self {
                unique: true,
                ..Default::default()
            }
        }

        fn gets(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        fn go_down(&self) {
            self.unavailable.store(true, Ordering::SeqCst);
        }

        fn fail_delete(&self, username: &str) {
            self.failing_deletes.lock().insert(username.to_string());
        }

        fn check(&self) -> StoreResult<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            Ok(())
        }
    }

    impl SessionStore for TestStore {
        fn list_all(&self) -> StoreResult<Vec<Session>> {
            self.check()?;
            self.inner.list_all()
        }

        fn get(&self, username: &str) -> StoreResult<Option<Session>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            if self.hide_rows {
                return Ok(None);
            }
            let row = self.inner.get(username);
            if let Some(gate) = &self.hold_get {
                gate.hold();
            }
            row
        }

        fn insert(&self, username: &str, token: &str) -> StoreResult<()> {
            self.check()?;
            if self.unique && self.inner.get(username)?.is_some() {
                return Err(StoreError::DuplicateUser(username.to_string()));
            }
            self.inner.insert(username, token)?;
            if let Some(gate) = &self.hold_insert {
                gate.hold();
            }
            Ok(())
        }

        fn delete(&self, username: &str) -> StoreResult<bool> {
            self.check()?;
            if self.failing_deletes.lock().contains(username) {
                return Err(StoreError::Unavailable("delete timed out".into()));
            }
            self.inner.delete(username)
        }
    }

    struct FixedToken(&'static str);

    impl TokenGenerator for FixedToken {
        fn generate(&self) -> String {
            self.0.to_string()
        }
    }

    fn registry() -> SessionRegistry<TestStore> {
        SessionRegistry::new(RegistryConfig::new(), TestStore::default())
    }

    fn active(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_alice_lifecycle() {
        let registry = registry();

        let session = registry.create_session("alice").unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.token.len(), TOKEN_LENGTH);
        assert!(session.token.chars().all(|c| c.is_ascii_alphanumeric()));

        assert!(registry.validate("alice", &session.token));
        assert!(!registry.validate("alice", "wrong"));
        assert!(registry.remove_session("alice").unwrap());
        assert!(!registry.validate("alice", &session.token));
    }

    #[test]
    fn test_create_populates_cache() {
        let registry = registry();
        let session = registry.create_session("alice").unwrap();

        assert_eq!(registry.cached_usernames(), vec!["alice"]);

        let gets_before = registry.store().gets();
        assert!(registry.validate("alice", &session.token));
        assert_eq!(registry.store().gets(), gets_before);
    }

    #[test]
    fn test_create_twice_rejected_without_mutation() {
        let registry = registry();
        let first = registry.create_session("alice").unwrap();

        let second = registry.create_session("alice");
        assert!(matches!(second, Err(Error::AlreadyExists(ref u)) if u == "alice"));

        let stored = registry.store().inner.get("alice").unwrap().unwrap();
        assert_eq!(stored.token, first.token);
        assert!(registry.validate("alice", &first.token));
        assert_eq!(registry.cached_usernames(), vec!["alice"]);
    }

    #[test]
    fn test_create_trims_username() {
        let registry = registry();
        let session = registry.create_session("  alice ").unwrap();

        assert_eq!(session.username, "alice");
        assert!(registry.validate("alice", &session.token));
        assert!(matches!(
            registry.create_session("alice"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_empty_username_rejected() {
        let registry = registry();

        assert!(matches!(registry.create_session(""), Err(Error::InvalidInput(_))));
        assert!(matches!(registry.create_session("   "), Err(Error::InvalidInput(_))));
        assert!(matches!(registry.remove_session(""), Err(Error::InvalidInput(_))));
        assert!(!registry.validate("", "anything"));
        assert!(registry.store().inner.is_empty());
        assert_eq!(registry.stats().misses, 1);
    }

    #[test]
    fn test_create_store_failure_leaves_cache_untouched() {
        let registry = registry();
        registry.store().go_down();

        let result = registry.create_session("alice");
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
        assert!(registry.cached_usernames().is_empty());
    }

    #[test]
    fn test_duplicate_user_maps_to_already_exists() {
        // get() never sees the row, so only the store constraint catches it
        let store = TestStore {
            hide_rows: true,
            ..TestStore::unique()
        };
        let registry = SessionRegistry::new(RegistryConfig::new(), store)
            .with_generator(FixedToken("first"));

        registry.create_session("alice").unwrap();
        let second = registry.create_session("alice");

        assert!(matches!(second, Err(Error::AlreadyExists(_))));
        let stored = registry.store().inner.get("alice").unwrap().unwrap();
        assert_eq!(stored.token, "first");
    }

    #[test]
    fn test_store_fallback_backfills_cache() {
        let registry = registry();
        registry.store().inner.insert("alice", "seeded").unwrap();

        assert!(registry.validate("alice", "seeded"));
        assert_eq!(registry.store().gets(), 1);
        assert_eq!(registry.cached_usernames(), vec!["alice"]);

        assert!(registry.validate("alice", "seeded"));
        assert_eq!(registry.store().gets(), 1);

        let stats = registry.stats();
        assert_eq!(stats.store_hits, 1);
        assert_eq!(stats.cache_hits, 1);
    }

    #[test]
    fn test_wrong_token_not_backfilled() {
        let registry = registry();
        registry.store().inner.insert("alice", "seeded").unwrap();

        assert!(!registry.validate("alice", "guess"));
        assert!(registry.cached_usernames().is_empty());
        assert_eq!(registry.stats().misses, 1);
    }

    #[test]
    fn test_validate_store_down_is_false() {
        let registry = registry();
        registry.store().inner.insert("alice", "seeded").unwrap();
        registry.store().go_down();

        assert!(!registry.validate("alice", "seeded"));
        assert!(matches!(
            registry.try_validate("alice", "seeded"),
            Err(Error::StoreUnavailable(_))
        ));
        assert_eq!(registry.stats().store_errors, 2);
    }

    #[test]
    fn test_cache_hit_survives_store_outage() {
        let registry = registry();
        let session = registry.create_session("alice").unwrap();
        registry.store().go_down();

        assert!(registry.validate("alice", &session.token));
    }

    #[test]
    fn test_remove_evicts_even_when_store_fails() {
        let registry = registry();
        let session = registry.create_session("alice").unwrap();
        registry.store().fail_delete("alice");

        assert!(matches!(
            registry.remove_session("alice"),
            Err(Error::StoreUnavailable(_))
        ));
        assert!(registry.cached_usernames().is_empty());

        // The row survived, so the fallback path still finds it.
        assert!(registry.validate("alice", &session.token));
    }

    #[test]
    fn test_remove_absent_user() {
        let registry = registry();
        assert!(!registry.remove_session("ghost").unwrap());
    }

    #[test]
    fn test_cache_capacity_through_registry() {
        let registry = SessionRegistry::new(
            RegistryConfig::new().with_cache_size(3),
            TestStore::default(),
        );
        for name in ["a", "b", "c", "d", "e"] {
            registry.create_session(name).unwrap();
        }

        assert_eq!(registry.cached_usernames(), vec!["c", "d", "e"]);
        assert_eq!(registry.stats().cache.size, 3);
    }

    #[test]
    fn test_reconcile_empty_active_removes_all() {
        let registry = registry();
        for name in ["alice", "bob", "carol"] {
            registry.create_session(name).unwrap();
        }

        let report = registry.reconcile(&HashSet::new()).unwrap();
        assert_eq!(report.removed, 3);
        assert!(report.is_complete());
        assert!(registry.store().inner.is_empty());
        assert!(registry.cached_usernames().is_empty());
    }

    #[test]
    fn test_reconcile_keeps_active() {
        let registry = registry();
        let alice = registry.create_session("alice").unwrap();
        let bob = registry.create_session("bob").unwrap();
        registry.create_session("carol").unwrap();

        let report = registry.reconcile(&active(&["alice"])).unwrap();

        assert_eq!(report.removed, 2);
        assert!(registry.validate("alice", &alice.token));
        assert!(!registry.validate("bob", &bob.token));
        assert_eq!(registry.store().inner.len(), 1);
    }

    #[test]
    fn test_reconcile_continues_past_failures() {
        let registry = registry();
        for name in ["alice", "bob", "carol"] {
            registry.create_session(name).unwrap();
        }
        registry.store().fail_delete("bob");

        let report = registry.reconcile(&HashSet::new()).unwrap();

        assert_eq!(report.removed, 2);
        assert_eq!(report.failed, 1);
        assert!(matches!(report.first_error, Some(Error::StoreUnavailable(_))));
        assert_eq!(registry.store().inner.len(), 1);
    }

    #[test]
    fn test_reconcile_trims_active_names() {
        let registry = registry();
        let alice = registry.create_session(" alice ").unwrap();
        registry.create_session("bob").unwrap();

        let report = registry.reconcile(&active(&[" alice ", "   "])).unwrap();

        assert_eq!(report.removed, 1);
        assert!(registry.validate("alice", &alice.token));
        assert_eq!(registry.store().inner.len(), 1);
    }

    #[test]
    fn test_remove_during_store_fallback_is_not_backfilled() {
        let gate = Gate::new();
        let store = TestStore {
            hold_get: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        store.inner.insert("alice", "seeded").unwrap();
        let registry = Arc::new(SessionRegistry::new(RegistryConfig::new(), store));

        let validator = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.validate("alice", "seeded"))
        };

        // The validator has read the row but not yet filled the cache.
        gate.wait_held();
        assert!(registry.remove_session("alice").unwrap());
        gate.release();

        // It observed the row before the removal, so true is a fair answer.
        assert!(validator.join().unwrap());
        assert!(registry.cached_usernames().is_empty());
        assert!(!registry.validate("alice", "seeded"));
    }

    #[test]
    fn test_remove_during_create_is_not_cached() {
        let gate = Gate::new();
        let store = TestStore {
            hold_insert: Some(Arc::clone(&gate)),
            ..Default::default()
        };
        let registry = Arc::new(
            SessionRegistry::new(RegistryConfig::new(), store).with_generator(FixedToken("tok")),
        );

        let creator = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.create_session("alice"))
        };

        // The row is written; the cache fill has not happened yet.
        gate.wait_held();
        assert!(registry.remove_session("alice").unwrap());
        gate.release();

        assert_eq!(creator.join().unwrap().unwrap().token, "tok");
        assert!(registry.cached_usernames().is_empty());
        assert!(!registry.validate("alice", "tok"));
    }

    #[test]
    fn test_unrelated_validation_still_backfills_after_remove() {
        let registry = registry();
        registry.create_session("bob").unwrap();
        registry.remove_session("bob").unwrap();
        registry.store().inner.insert("alice", "seeded").unwrap();

        assert!(registry.validate("alice", "seeded"));
        assert_eq!(registry.cached_usernames(), vec!["alice"]);
    }

    #[test]
    fn test_reconcile_list_failure() {
        let registry = registry();
        registry.create_session("alice").unwrap();
        registry.store().go_down();

        assert!(matches!(
            registry.reconcile(&HashSet::new()),
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_get_session() {
        let registry = registry();
        let created = registry.create_session("alice").unwrap();

        assert_eq!(registry.get_session("alice").unwrap().token, created.token);
        assert!(matches!(registry.get_session("bob"), Err(Error::NotFound(_))));
        assert_eq!(registry.list_sessions().unwrap().len(), 1);
        assert_eq!(registry.session_count().unwrap(), 1);

        registry.store().go_down();
        assert!(matches!(registry.session_count(), Err(Error::StoreUnavailable(_))));
    }

    #[test]
    fn test_concurrent_access() {
        let registry = Arc::new(SessionRegistry::in_memory(
            RegistryConfig::new().with_cache_size(4),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let name = format!("user-{}", i);
                    let session = registry.create_session(&name).unwrap();
                    for _ in 0..50 {
                        assert!(registry.validate(&name, &session.token));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.store().len(), 8);
        assert_eq!(registry.stats().cache.size, 4);
    }
}
