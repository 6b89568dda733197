use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::{
    context::Context,
    delivery::Delivery,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Logger {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(LoggingHandler { inner: next })
    }
}

struct LoggingHandler {
    inner: BoxHandler,
}

#[async_trait]
impl Handler for LoggingHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        let routing_key = delivery.routing_key.clone();
        let started = Instant::now();

        info!(
            routing_key = %routing_key,
            bytes = delivery.body.len(),
            redelivered = delivery.redelivered,
            "delivery received"
        );

        let res = self.inner.handle(ctx, rw, delivery).await;
        match &res {
            Ok(()) => debug!(
                routing_key = %routing_key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "delivery handled"
            ),
            Err(e) => error!(routing_key = %routing_key, "delivery failed: {:#}", e),
        }

        res
    }
}
