//! Identity module
//!
//! Resolves the acting principal for a gated operation: the request-scoped
//! principal when the host bound one, else the identity of the process.

pub mod context;
pub mod provider;

pub use context::{RequestContext, RequestGuard};
pub use provider::{BoxedIdentityProvider, Identity, IdentityProvider, ProcessIdentityProvider};
