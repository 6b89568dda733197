//! Composition of middlewares around a handler.
//!
//! ```text
//! chain(t, &[a, b, c])  ==  a.wrap(b.wrap(c.wrap(t)))
//!
//! a-before
//!   b-before
//!     c-before
//!       t
//!     c-after
//!   b-after
//! a-after
//! ```
//!
//! Composition runs once, at registration time. The resulting handler is
//! invoked once per message for as long as it is registered.

use std::sync::Arc;

use crate::{
    handler::BoxHandler,
    middleware::{BoxMiddleware, Middleware},
};

/// Nests `middlewares` around `next`, first element outermost.
///
/// Each middleware's `wrap` is called exactly once, last to first. With no
/// middlewares `next` is returned as is. The result keeps no reference to the
/// slice, so later changes to the caller's list never reach it.
pub fn chain(next: BoxHandler, middlewares: &[BoxMiddleware]) -> BoxHandler {
    middlewares
        .iter()
        .rev()
        .fold(next, |acc, middleware| middleware.wrap(acc))
}

/// Ordered, reusable list of middlewares.
///
/// The same `Chain` can be applied to many handlers; every application calls
/// each middleware's `wrap` once for that handler.
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<BoxMiddleware>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `middleware` as the innermost layer so far.
    #[must_use]
    pub fn layer<M: Middleware>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn layer_boxed(mut self, middleware: BoxMiddleware) -> Self {
        self.middlewares.push(middleware);
        self
    }

    #[must_use]
    pub fn layer_fn<F>(self, f: F) -> Self
    where
        F: Fn(BoxHandler) -> BoxHandler + Send + Sync + 'static,
    {
        self.layer(f)
    }

    /// Appends `other` inside the current layers.
    #[must_use]
    pub fn extend(mut self, other: &Chain) -> Self {
        self.middlewares.extend(other.middlewares.iter().cloned());
        self
    }

    /// Puts `other` outside the current layers.
    #[must_use]
    pub fn prepend(self, other: &Chain) -> Self {
        other.clone().extend(&self)
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn middlewares(&self) -> &[BoxMiddleware] {
        &self.middlewares
    }

    pub fn then(&self, handler: BoxHandler) -> BoxHandler {
        chain(handler, &self.middlewares)
    }
}

impl FromIterator<BoxMiddleware> for Chain {
    fn from_iter<I: IntoIterator<Item = BoxMiddleware>>(iter: I) -> Self {
        Self {
            middlewares: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}
