use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, info_span};

use crate::{
    context::Context,
    delivery::Delivery,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

/// Runs every inner layer inside a `delivery` span.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Trace {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(TraceHandler { inner: next })
    }
}

struct TraceHandler {
    inner: BoxHandler,
}

#[async_trait]
impl Handler for TraceHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        let span = info_span!(
            "delivery",
            routing_key = %delivery.routing_key,
            correlation_id = delivery.correlation_id.as_deref().unwrap_or("-"),
        );

        self.inner.handle(ctx, rw, delivery).instrument(span).await
    }
}
