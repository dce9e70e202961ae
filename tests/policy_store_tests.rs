//! Policy store reload tests
//!
//! Covers the reload rule against real files (modification time pinned),
//! search-path discovery, failure absorption and torn-read freedom under
//! concurrent reload.

mod common;

use common::{ManualClock, QUIESCENCE_MS, policy_toml, write_policy};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use table_gate::config::GateConfig;
use table_gate::error::PolicyError;
use table_gate::policy::{
    Clock, FilePolicySource, PolicyDocument, PolicyLocation, PolicySource, PolicyStore,
    ReloadState, ResourceStat,
};

const T: u64 = 1_700_000_000_000;

fn file_store(path: &std::path::Path, clock: Arc<ManualClock>) -> PolicyStore {
    let source = FilePolicySource::new(PolicyLocation::Explicit(path.to_path_buf()));
    PolicyStore::new(Box::new(source), Duration::from_millis(QUIESCENCE_MS)).with_clock(clock)
}

#[test]
fn test_quiescence_window_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &[]), T);

    let clock = ManualClock::at(T);
    let store = file_store(&path, clock.clone());

    for now in [T, T + 1, T + QUIESCENCE_MS] {
        clock.set(now);
        store.maybe_reload();
        assert!(store.snapshot().admin_identities().is_empty(), "now = {}", now);
        assert_eq!(store.reload_state(), ReloadState::default());
    }

    clock.set(T + QUIESCENCE_MS + 1);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"));
    assert_eq!(store.reload_state().last_resource_modified, T);
    assert_eq!(store.reload_state().last_successful_reload, T + QUIESCENCE_MS + 1);
}

#[test]
fn test_edit_is_picked_up_after_quiescence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &["finance"]), T);

    let clock = ManualClock::at(T + 2 * QUIESCENCE_MS);
    let store = file_store(&path, clock.clone());
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"));

    // Operator edits the file ten minutes later
    let edited = T + 10 * QUIESCENCE_MS;
    write_policy(&path, &policy_toml(&["bob"], &[]), edited);

    clock.set(edited + 30_000);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"), "edit still settling");

    clock.set(edited + QUIESCENCE_MS + 1);
    store.maybe_reload();
    let snapshot = store.snapshot();
    assert!(snapshot.is_admin("bob"));
    assert!(!snapshot.is_admin("alice"));
    assert!(snapshot.protected_tables().is_empty());
}

#[test]
fn test_repeated_reload_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &[]), T);

    let clock = ManualClock::at(T + 2 * QUIESCENCE_MS);
    let store = file_store(&path, clock.clone());
    store.maybe_reload();
    let first = store.snapshot();
    let state = store.reload_state();

    // Same modification time, different content: never picked up
    write_policy(&path, &policy_toml(&["mallory"], &[]), T);
    for step in 1..5 {
        clock.set(T + (2 + step) * QUIESCENCE_MS);
        store.maybe_reload();
        assert!(Arc::ptr_eq(&first, &store.snapshot()));
        assert_eq!(store.reload_state(), state);
    }
}

#[test]
fn test_modification_older_than_last_reload_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &[]), T);

    let clock = ManualClock::at(T + 5 * QUIESCENCE_MS);
    let store = file_store(&path, clock.clone());
    store.maybe_reload();

    // Rewritten with a modification time before the last reload
    write_policy(&path, &policy_toml(&["mallory"], &[]), T + QUIESCENCE_MS);
    clock.set(T + 10 * QUIESCENCE_MS);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"));
    assert!(!store.snapshot().is_admin("mallory"));
}

#[test]
fn test_deleted_file_keeps_last_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &[]), T);

    let clock = ManualClock::at(T + 2 * QUIESCENCE_MS);
    let store = file_store(&path, clock.clone());
    store.maybe_reload();

    std::fs::remove_file(&path).unwrap();
    clock.set(T + 10 * QUIESCENCE_MS);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"));
}

#[test]
fn test_corrupt_edit_keeps_last_policy_and_retries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &["finance"]), T);

    let clock = ManualClock::at(T + 2 * QUIESCENCE_MS);
    let store = file_store(&path, clock.clone());
    store.maybe_reload();
    let state = store.reload_state();

    let edited = T + 10 * QUIESCENCE_MS;
    write_policy(&path, "[admin\nusers = [\"bo", edited);
    clock.set(edited + QUIESCENCE_MS + 1);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("alice"));
    assert!(store.snapshot().protected_tables().matches("finance"));
    assert_eq!(store.reload_state(), state);

    write_policy(&path, &policy_toml(&["bob"], &[]), edited + 1);
    clock.set(edited + 2 * QUIESCENCE_MS);
    store.maybe_reload();
    assert!(store.snapshot().is_admin("bob"));
}

#[test]
fn test_from_config_uses_search_path() {
    let empty = tempfile::tempdir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    write_policy(
        &dir.path().join("table-admin.toml"),
        &policy_toml(&["carol"], &[]),
        T,
    );

    let mut config = GateConfig::default();
    config.policy.search_paths = vec![
        empty.path().display().to_string(),
        dir.path().display().to_string(),
    ];

    let store = PolicyStore::from_config(&config)
        .unwrap()
        .with_clock(ManualClock::at(T + 2 * QUIESCENCE_MS));
    store.maybe_reload();
    assert!(store.snapshot().is_admin("carol"));
}

#[test]
fn test_from_config_explicit_file_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admins.toml");
    write_policy(&path, &policy_toml(&["dave"], &[]), T);

    let mut config = GateConfig::default();
    config.admin.file = Some(format!("file://{}", path.display()));

    let store = PolicyStore::from_config(&config)
        .unwrap()
        .with_clock(ManualClock::at(T + 2 * QUIESCENCE_MS));
    store.maybe_reload();
    assert!(store.snapshot().is_admin("dave"));
}

#[test]
fn test_from_config_rejects_remote_url() {
    let mut config = GateConfig::default();
    config.admin.file = Some("https://example.com/admins.toml".to_string());
    assert!(matches!(
        PolicyStore::from_config(&config),
        Err(PolicyError::UnsupportedLocation(_))
    ));
}

/// File source whose file is truncated by an operator right after the first stat
struct TruncatedAfterStat {
    inner: FilePolicySource,
    path: std::path::PathBuf,
    clock: Arc<ManualClock>,
    truncate_at: Mutex<Option<u64>>,
}

impl PolicySource for TruncatedAfterStat {
    fn stat(&self) -> Result<Option<ResourceStat>, PolicyError> {
        let stat = self.inner.stat();
        if let Some(modified) = self.truncate_at.lock().unwrap().take() {
            write_policy(&self.path, &policy_toml(&[], &[]), modified);
            self.clock.set(modified + 1);
        }
        stat
    }

    fn load(&self, stat: &ResourceStat) -> Result<PolicyDocument, PolicyError> {
        self.inner.load(stat)
    }
}

#[test]
fn test_file_rewritten_during_reload_is_picked_up_later() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table-admin.toml");
    write_policy(&path, &policy_toml(&["alice"], &[]), T);

    let edited = T + 10 * QUIESCENCE_MS;
    let clock = ManualClock::at(T + 2 * QUIESCENCE_MS);
    let source = TruncatedAfterStat {
        inner: FilePolicySource::new(PolicyLocation::Explicit(path.clone())),
        path: path.clone(),
        clock: clock.clone(),
        truncate_at: Mutex::new(Some(edited)),
    };
    let store = PolicyStore::new(Box::new(source), Duration::from_millis(QUIESCENCE_MS))
        .with_clock(clock.clone());

    // The half-written file never becomes the policy
    store.maybe_reload();
    assert_eq!(store.reload_state(), ReloadState::default());

    // The operator finishes the edit; it is loaded once quiet
    write_policy(&path, &policy_toml(&["alice", "bob"], &[]), edited + 5);
    clock.set(edited + 5 + QUIESCENCE_MS + 1);
    store.maybe_reload();
    let snapshot = store.snapshot();
    assert!(snapshot.is_admin("alice"));
    assert!(snapshot.is_admin("bob"));
    assert_eq!(store.reload_state().last_resource_modified, edited + 5);
}

// =============================================================================
// Concurrency
// =============================================================================

/// Every generation `n` pairs admin `u{n}` with protected table `t{n}`
struct GenerationSource {
    modified: Arc<AtomicU64>,
}

impl PolicySource for GenerationSource {
    fn stat(&self) -> Result<Option<ResourceStat>, PolicyError> {
        Ok(Some(ResourceStat::new(
            "generation",
            self.modified.load(Ordering::SeqCst),
        )))
    }

    fn load(&self, stat: &ResourceStat) -> Result<PolicyDocument, PolicyError> {
        let n = stat.modified_ms;
        PolicyDocument::from_toml_str(
            &format!("[admin]\nusers = [\"u{n}\"]\n[admin.white]\ntables = [\"t{n}\"]\n"),
            &stat.display_location(),
        )
    }
}

/// Always one millisecond past the current generation
struct TrailingClock {
    modified: Arc<AtomicU64>,
}

impl Clock for TrailingClock {
    fn now_millis(&self) -> u64 {
        self.modified.load(Ordering::SeqCst) + 1
    }
}

#[test]
fn test_concurrent_readers_never_see_torn_snapshot() {
    let modified = Arc::new(AtomicU64::new(10));
    let store = Arc::new(
        PolicyStore::new(
            Box::new(GenerationSource {
                modified: modified.clone(),
            }),
            Duration::ZERO,
        )
        .with_clock(Arc::new(TrailingClock {
            modified: modified.clone(),
        })),
    );
    let done = Arc::new(AtomicBool::new(false));
    let seen = Arc::new(Mutex::new(std::collections::BTreeSet::new()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            let seen = Arc::clone(&seen);
            std::thread::spawn(move || {
                let mut last_generation = 0u64;
                while !done.load(Ordering::SeqCst) {
                    // Readers also trigger reloads, as the gate does
                    store.maybe_reload();
                    let snapshot = store.snapshot();
                    let admins: Vec<_> = snapshot.admin_identities().iter().cloned().collect();
                    let tables: Vec<_> = snapshot.protected_tables().iter().collect();
                    match (admins.as_slice(), tables.as_slice()) {
                        ([], []) => {}
                        ([admin], [table]) => {
                            assert_eq!(admin.trim_start_matches('u'), table.trim_start_matches('t'));
                            // Commits are monotonic, so a reader never goes back in time
                            let generation: u64 = admin[1..].parse().unwrap();
                            assert!(generation >= last_generation);
                            last_generation = generation;
                            seen.lock().unwrap().insert(admin.clone());
                        }
                        other => panic!("torn snapshot: {:?}", other),
                    }
                }
            })
        })
        .collect();

    for generation in 0..200u64 {
        // Step by 2 so each generation is newer than the last reload time
        modified.store(10 + 2 * generation, Ordering::SeqCst);
        store.maybe_reload();
        std::thread::yield_now();
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.join().unwrap();
    }

    assert!(!seen.lock().unwrap().is_empty());

    // A reader may have committed an older generation after the last write;
    // a forced reload catches up without going backwards
    store.force_reload().unwrap();
    assert_eq!(store.reload_state().last_resource_modified, 10 + 2 * 199);
    assert!(store.snapshot().is_admin(&format!("u{}", 10 + 2 * 199)));
}
