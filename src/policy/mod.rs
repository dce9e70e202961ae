//! Policy module
//!
//! Loads the admin set and the protected-table list from an external
//! resource and keeps an eventually-fresh, immutable snapshot of them.
//!
//! ## Reload rule
//!
//! A new snapshot is committed only when the resource modification time `T`
//! is newer than the last successful reload and `now > T + quiescence`
//! (60 seconds by default). The wait debounces reloads while an operator is
//! still rewriting the file.

pub mod clock;
pub mod snapshot;
pub mod source;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use snapshot::{PolicySnapshot, ProtectedTables, WILDCARD};
pub use source::{
    ADMIN_USERS_KEY, FilePolicySource, PolicyDocument, PolicyLocation, PolicySource,
    ResourceStat, WHITE_TABLES_KEY,
};
pub use store::{PolicyStore, ReloadState};
