use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{context::Context, delivery::Delivery, response::ResponseWriter};

/// Processes one inbound message.
///
/// Terminal business logic and every composed chain share this trait, so a
/// chain can be passed anywhere a handler is expected, including as the
/// `next` of another chain.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()>;
}

/// Shared, type-erased handler as stored in a routing table.
pub type BoxHandler = Arc<dyn Handler>;

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        (**self).handle(ctx, rw, delivery).await
    }
}

/// Handler backed by a closure. Built with [`handler_fn`].
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Context, ResponseWriter, Delivery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        (self.0)(ctx, rw, delivery).await
    }
}

/// Turns an async closure into a [`BoxHandler`].
///
/// ```
/// use relay::{handler_fn, BoxHandler};
///
/// let ping: BoxHandler = handler_fn(|_ctx, rw, _delivery| async move {
///     rw.write("pong").await
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> BoxHandler
where
    F: Fn(Context, ResponseWriter, Delivery) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(HandlerFn(f))
}
