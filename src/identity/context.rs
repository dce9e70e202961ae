//! Request-scoped principal
//!
//! The host binds the caller's principal to the handling thread for the
//! duration of an inbound operation. Outside such a scope there is no
//! request principal and checks fall back to the process identity.

use crate::identity::provider::Identity;
use std::cell::RefCell;

thread_local! {
    static REQUEST_USER: RefCell<Option<Identity>> = const { RefCell::new(None) };
}

/// Thread-local binding of the current request principal
pub struct RequestContext;

impl RequestContext {
    /// Bind `identity` to the current thread until the guard is dropped
    pub fn enter(identity: Identity) -> RequestGuard {
        let previous = REQUEST_USER.with(|user| user.replace(Some(identity)));
        RequestGuard { previous }
    }

    /// Run `f` with `identity` bound as the request principal
    pub fn scope<R>(identity: Identity, f: impl FnOnce() -> R) -> R {
        let _guard = Self::enter(identity);
        f()
    }

    /// Principal of the operation being handled on this thread
    pub fn current() -> Option<Identity> {
        REQUEST_USER.with(|user| user.borrow().clone())
    }

    pub fn is_in_request() -> bool {
        REQUEST_USER.with(|user| user.borrow().is_some())
    }
}

/// Restores the previous binding on drop
#[must_use = "the request principal is unbound when the guard is dropped"]
pub struct RequestGuard {
    previous: Option<Identity>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        REQUEST_USER.with(|user| *user.borrow_mut() = previous);
    }
}
