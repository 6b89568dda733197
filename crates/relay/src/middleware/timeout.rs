use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::warn;

use crate::{
    context::Context,
    delivery::Delivery,
    error::ChainError,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

/// Bounds the time spent in the wrapped handler.
///
/// Inner layers receive a derived context carrying the tighter deadline, so
/// they can observe it without knowing this layer exists.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Middleware for Timeout {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(TimeoutHandler {
            inner: next,
            duration: self.duration,
        })
    }
}

struct TimeoutHandler {
    inner: BoxHandler,
    duration: Duration,
}

#[async_trait]
impl Handler for TimeoutHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        let scoped = ctx.with_timeout(self.duration);
        let routing_key = delivery.routing_key.clone();

        match scoped.run(self.inner.handle(scoped.clone(), rw, delivery)).await {
            Ok(res) => res,
            Err(ChainError::DeadlineExceeded) if !ctx.is_expired() => {
                warn!(routing_key = %routing_key, timeout = ?self.duration, "handler timed out");
                scoped.cancel();
                Err(ChainError::Timeout(self.duration).into())
            }
            Err(stop) => Err(stop.into()),
        }
    }
}
