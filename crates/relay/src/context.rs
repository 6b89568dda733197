//! Per-message execution context.
//!
//! A [`Context`] is the only cancellation channel threaded through a chain.
//! Composition passes it along untouched; a middleware that wants a tighter
//! budget derives a child with [`Context::with_timeout`] and hands that to its
//! successor instead.

use std::{future::Future, time::Duration};

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ChainError;

#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    #[must_use]
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context that is never cancelled unless [`Context::cancel`] is called.
    #[must_use]
    pub fn background() -> Self {
        Self::new(CancellationToken::new())
    }

    /// Derived context: cancelled together with `self`, but cancelling it
    /// leaves `self` untouched.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derived context whose deadline is the earlier of `deadline` and the
    /// parent's own.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };

        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// A timeout too large to represent as an instant adds no deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Error describing why the context is finished, if it is.
    pub fn err(&self) -> Option<ChainError> {
        if self.is_cancelled() {
            Some(ChainError::Cancelled)
        } else if self.is_expired() {
            Some(ChainError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ChainError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;

                    _ = self.token.cancelled() => ChainError::Cancelled,
                    _ = time::sleep_until(deadline) => ChainError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ChainError::Cancelled
            }
        }
    }

    /// Drives `fut` until it completes or the context finishes, whichever
    /// comes first. A finished context wins ties.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ChainError>
    where
        F: Future,
    {
        tokio::select! {
            biased;

            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
        assert!(ctx.err().is_none());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = Context::background();
        let child = parent.child();

        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_parent_cancel_reaches_child() {
        let parent = Context::background();
        let child = parent.child();

        parent.cancel();

        assert!(child.is_cancelled());
        assert_eq!(child.err(), Some(ChainError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_keeps_earlier_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(10));

        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(100));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn test_unbounded_timeout_adds_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(ctx.err().is_none());

        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_done_reports_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));

        assert_eq!(ctx.done().await, ChainError::DeadlineExceeded);
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_before_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(1));

        let out = ctx
            .run(async {
                time::sleep(Duration::from_millis(10)).await;
                7
            })
            .await;

        assert_eq!(out, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));

        let out = ctx.run(time::sleep(Duration::from_secs(5))).await;

        assert_eq!(out, Err(ChainError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let ctx = Context::background();
        ctx.cancel();

        let out = ctx.run(std::future::pending::<()>()).await;

        assert_eq!(out, Err(ChainError::Cancelled));
    }
}
