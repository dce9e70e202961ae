//! Identity provider trait
//!
//! Resolves the principal a check applies to. The host supplies the
//! request-scoped principal; the process identity is the fallback.

use crate::identity::context::RequestContext;
use std::fmt;
use std::sync::Arc;

/// Acting principal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    principal: Arc<str>,
}

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into().into(),
        }
    }

    /// Full principal name, e.g. `alice/host.example.com@EXAMPLE.COM`
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Short name used for admin membership: the principal up to the first
    /// `/` or `@`
    pub fn short_name(&self) -> &str {
        self.principal
            .split(['/', '@'])
            .next()
            .unwrap_or(&self.principal)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Source of acting identities
pub trait IdentityProvider: Send + Sync {
    /// Principal bound to the current inbound operation, if any
    fn request_user(&self) -> Option<Identity>;

    /// Identity the process itself runs as
    fn current_user(&self) -> Option<Identity>;

    /// Request principal first, then the process identity
    fn active_user(&self) -> Option<Identity> {
        self.request_user().or_else(|| self.current_user())
    }
}

/// Box type alias for identity providers
pub type BoxedIdentityProvider = Box<dyn IdentityProvider>;

/// Default provider: [`RequestContext`] for the request principal and the
/// login name of the process for the fallback
#[derive(Debug, Clone, Default)]
pub struct ProcessIdentityProvider {
    process_user: Option<Identity>,
}

impl ProcessIdentityProvider {
    pub fn new(process_user: Option<Identity>) -> Self {
        Self { process_user }
    }

    /// Process identity from USER, LOGNAME or USERNAME, in that order
    pub fn from_env() -> Self {
        let process_user = ["USER", "LOGNAME", "USERNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|name| !name.is_empty())
            .map(Identity::new);

        Self { process_user }
    }
}

impl IdentityProvider for ProcessIdentityProvider {
    fn request_user(&self) -> Option<Identity> {
        RequestContext::current()
    }

    fn current_user(&self) -> Option<Identity> {
        self.process_user.clone()
    }
}
