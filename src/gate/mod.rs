//! Access gate module
//!
//! Decides whether the acting identity may create, delete or modify a table.
//!
//! ## Rules
//!
//! - Tables prefixed with an exempt prefix (`temp_`, `test_`) are open to anyone
//! - The system metadata table may always be created
//! - Protected tables (exact names or `prefix*` patterns) can never be deleted
//! - Everything else requires the acting identity to be an administrator

pub mod access_gate;
pub mod observer;
pub mod types;

pub use access_gate::AccessGate;
pub use observer::TableAccessObserver;
pub use types::{RegionInfo, TableDescriptor, TableOperation};
