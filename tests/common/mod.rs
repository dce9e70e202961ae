//! Shared test fixtures

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use table_gate::identity::{Identity, IdentityProvider};
use table_gate::policy::Clock;

pub const QUIESCENCE_MS: u64 = 60_000;

/// Clock under test control
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn at(now: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(now)))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Identity provider returning fixed principals
pub struct StaticIdentities {
    pub request: Option<Identity>,
    pub process: Option<Identity>,
}

impl StaticIdentities {
    pub fn request(name: &str) -> Box<Self> {
        Box::new(Self {
            request: Some(Identity::new(name)),
            process: None,
        })
    }
}

impl IdentityProvider for StaticIdentities {
    fn request_user(&self) -> Option<Identity> {
        self.request.clone()
    }

    fn current_user(&self) -> Option<Identity> {
        self.process.clone()
    }
}

/// Render a policy file
pub fn policy_toml(admins: &[&str], protected: &[&str]) -> String {
    let quote = |items: &[&str]| {
        items
            .iter()
            .map(|s| format!("\"{}\"", s))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "[admin]\nusers = [{}]\n\n[admin.white]\ntables = [{}]\n",
        quote(admins),
        quote(protected)
    )
}

/// Write `content` to `path` and pin its modification time
pub fn write_policy(path: &Path, content: &str, modified_ms: u64) {
    fs::write(path, content).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(UNIX_EPOCH + Duration::from_millis(modified_ms))
        .unwrap();
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
