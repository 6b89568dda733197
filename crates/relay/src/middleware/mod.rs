//! Middleware: a transform from one handler into a handler that wraps it.
//!
//! ```text
//! struct Audit;
//!
//! impl Middleware for Audit {
//!     fn wrap(&self, next: BoxHandler) -> BoxHandler {
//!         // one-time setup runs here, once per composition
//!         Arc::new(AuditHandler { next })
//!     }
//! }
//! ```
//!
//! The returned handler owns `next` and decides whether to call it at all,
//! how many times, and what to do with its result.

pub mod auth;
pub mod logger;
pub mod rate_limit;
pub mod retry;
pub mod timeout;
pub mod trace;

use std::sync::Arc;

use crate::handler::BoxHandler;

pub use auth::Auth;
pub use logger::Logger;
pub use rate_limit::RateLimit;
pub use retry::Retry;
pub use timeout::Timeout;
pub use trace::Trace;

pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxHandler) -> BoxHandler;
}

pub type BoxMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        self(next)
    }
}

/// Boxes a closure middleware.
pub fn middleware_fn<F>(f: F) -> BoxMiddleware
where
    F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
{
    Arc::new(f)
}
