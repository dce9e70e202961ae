//! Table admin gate
//!
//! An authorization gate for table-lifecycle operations (create, delete,
//! modify) on a shared table-storage cluster. The host control plane calls
//! the gate before each operation; the gate allows it or returns a
//! descriptive denial.
//!
//! ## Features
//!
//! - **Admin-only table management** driven by an external policy file
//! - **Protected tables** that can never be deleted, with `prefix*` patterns
//! - **Sandbox prefixes** (`temp_`, `test_`) anyone may manage
//! - **Hot reload** of the policy, debounced against half-written files
//!
//! ## Example Policy
//!
//! ```toml
//! [admin]
//! users = ["alice", "bob"]
//!
//! [admin.white]
//! tables = ["archive_*", "finance"]   # never deletable
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use table_gate::{AccessGate, PolicyStore, load_config};
//!
//! let config = load_config(None)?;
//! let store = Arc::new(PolicyStore::from_config(&config)?);
//! let gate = AccessGate::from_config(&config, store);
//!
//! gate.check_delete(b"temp_scratch")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod policy;

// Re-export main types
pub use config::{GateConfig, load_config};
pub use error::{GateError, GateResult};
pub use gate::{AccessGate, TableAccessObserver};
pub use identity::{Identity, IdentityProvider, RequestContext};
pub use policy::{PolicySnapshot, PolicyStore};
