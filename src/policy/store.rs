//! Reloadable policy store
//!
//! Holds the current [`PolicySnapshot`] and refreshes it from a
//! [`PolicySource`] when the resource has changed and the change has been
//! quiet for at least the quiescence interval. Reload is pull-based: the gate
//! calls [`PolicyStore::maybe_reload`] on every intercepted operation.
//!
//! Concurrency:
//! - readers load the snapshot through an `ArcSwap` and never block
//! - only one caller at a time runs the parse-and-commit path; concurrent
//!   callers skip the reload and keep using the current snapshot
//! - no lock is held across resource I/O; the state mutex only guards the
//!   final check-then-commit
//!
//! The reload time is taken before the resource is stat'ed, and the resource
//! is stat'ed again after it has been read. Content that changed underneath
//! the read is discarded and picked up once the new edit has been quiet.

use crate::config::GateConfig;
use crate::error::PolicyError;
use crate::policy::clock::{Clock, SystemClock, duration_millis};
use crate::policy::snapshot::PolicySnapshot;
use crate::policy::source::{FilePolicySource, PolicySource, ResourceStat};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Reload bookkeeping, timestamps in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadState {
    /// Modification time of the resource behind the committed snapshot
    pub last_resource_modified: u64,
    /// Wall-clock time of the last committed reload (0 = never)
    pub last_successful_reload: u64,
}

impl ReloadState {
    /// Whether a resource modified at `modified` may be committed at `now`
    fn is_due(&self, modified: u64, now: u64, quiescence_ms: u64) -> bool {
        modified > self.last_successful_reload && now > modified.saturating_add(quiescence_ms)
    }
}

/// Time-bounded, stale-tolerant cache of the admin policy
pub struct PolicyStore {
    source: Box<dyn PolicySource>,
    clock: Arc<dyn Clock>,
    quiescence_ms: u64,
    snapshot: ArcSwap<PolicySnapshot>,
    state: Mutex<ReloadState>,
    reloading: AtomicBool,
}

impl PolicyStore {
    /// Create a store with an empty snapshot; nothing is loaded until the
    /// first reload
    pub fn new(source: Box<dyn PolicySource>, quiescence: Duration) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            quiescence_ms: duration_millis(quiescence),
            snapshot: ArcSwap::from_pointee(PolicySnapshot::empty()),
            state: Mutex::new(ReloadState::default()),
            reloading: AtomicBool::new(false),
        }
    }

    /// Create a store reading the file-backed policy resource from configuration
    pub fn from_config(config: &GateConfig) -> Result<Self, PolicyError> {
        let source = FilePolicySource::from_config(config)?;
        debug!(location = ?source.location(), "Using file policy source");
        Ok(Self::new(
            Box::new(source),
            Duration::from_millis(config.policy.quiescence_ms),
        ))
    }

    /// Replace the clock (useful for testing)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current snapshot; never blocks and never performs I/O
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.load_full()
    }

    /// Current reload bookkeeping
    pub fn reload_state(&self) -> ReloadState {
        *self.lock_state()
    }

    pub fn quiescence(&self) -> Duration {
        Duration::from_millis(self.quiescence_ms)
    }

    /// Reload the policy if the resource changed and has been quiet long enough.
    ///
    /// Failures are logged and absorbed: the previous snapshot and reload
    /// timestamps stay in place and the reload is retried on a later call.
    pub fn maybe_reload(&self) {
        let now = self.clock.now_millis();
        let stat = match self.source.stat() {
            Ok(Some(stat)) => stat,
            Ok(None) => {
                trace!("No policy resource found, keeping current policy");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to stat the policy resource");
                return;
            }
        };

        if !self
            .lock_state()
            .is_due(stat.modified_ms, now, self.quiescence_ms)
        {
            return;
        }

        let Some(_guard) = ReloadGuard::acquire(&self.reloading) else {
            debug!(location = %stat.location.display(), "Policy reload already in progress, skipping");
            return;
        };

        if let Err(e) = self.reload_from(&stat, now, false) {
            warn!(location = %stat.location.display(), error = %e, "Load the policy resource failed");
        }
    }

    /// Load the resource now, ignoring the quiescence window.
    ///
    /// Still refuses to replace a snapshot built from a newer resource.
    /// Returns `Ok(false)` when no resource was found or nothing was committed.
    pub fn force_reload(&self) -> Result<bool, PolicyError> {
        let now = self.clock.now_millis();
        let Some(stat) = self.source.stat()? else {
            return Ok(false);
        };

        let Some(_guard) = ReloadGuard::acquire(&self.reloading) else {
            return Ok(false);
        };

        self.reload_from(&stat, now, true)
    }

    fn reload_from(&self, stat: &ResourceStat, now: u64, force: bool) -> Result<bool, PolicyError> {
        let location = stat.display_location();
        info!(location = %location, modified = stat.modified_ms, "Reloading table admin policy");

        let snapshot = self.source.load(stat)?.to_snapshot();

        // The resource must still be the one that was stat'ed
        if self.source.stat()?.as_ref() != Some(stat) {
            debug!(location = %location, "Policy resource changed while loading, discarding");
            return Ok(false);
        }

        let mut state = self.lock_state();
        // Re-check under the lock: never replace a newer committed snapshot
        let accepted = if force {
            stat.modified_ms >= state.last_resource_modified
        } else {
            state.is_due(stat.modified_ms, now, self.quiescence_ms)
        };
        if !accepted {
            debug!(location = %location, "Policy resource superseded, discarding");
            return Ok(false);
        }

        let admins = snapshot.admin_identities().len();
        let protected = snapshot.protected_tables().len();
        self.snapshot.store(Arc::new(snapshot));
        state.last_resource_modified = stat.modified_ms;
        state.last_successful_reload = now;

        info!(
            location = %location,
            admins,
            protected_tables = protected,
            "Table admin policy reloaded"
        );
        Ok(true)
    }

    // Recover from a poisoned lock: the state is two plain timestamps
    fn lock_state(&self) -> MutexGuard<'_, ReloadState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("policy reload state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Marks a reload as in flight; cleared on drop
struct ReloadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReloadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ReloadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
