use async_trait::async_trait;
use relay::{ChainError, Context, Delivery, Handler, ResponseWriter};
use tracing::info;

/// Writes the delivery body back. Empty bodies are rejected.
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        if delivery.body.is_empty() {
            return Err(ChainError::Rejected("nothing to echo".into()).into());
        }

        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        info!(bytes = delivery.body.len(), "echoing");
        rw.write(delivery.body).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use relay::{Chain, middleware::Retry};
    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn test_echoes_body() {
        let (tx, mut rx) = mpsc::channel(1);

        EchoHandler::new()
            .handle(
                Context::background(),
                ResponseWriter::channel(tx),
                Delivery::new("echo", "hello"),
            )
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().body, b"hello");
    }

    #[tokio::test]
    async fn test_empty_body_fails() {
        let res = EchoHandler::new()
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("echo", ""),
            )
            .await;

        assert!(matches!(
            res.unwrap_err().downcast_ref::<ChainError>(),
            Some(ChainError::Rejected(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_body_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let handler = Chain::new()
            .layer(Retry::new(3))
            .layer_fn(move |next| {
                let counter = counter.clone();
                relay::handler_fn(move |ctx, rw, delivery| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let next = next.clone();
                    async move { next.handle(ctx, rw, delivery).await }
                })
            })
            .then(Arc::new(EchoHandler::new()));

        let res = handler
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("echo", ""),
            )
            .await;

        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_reply() {
        let (tx, mut rx) = mpsc::channel(1);
        let ctx = Context::background();
        ctx.cancel();

        let err = EchoHandler::new()
            .handle(ctx, ResponseWriter::channel(tx), Delivery::new("echo", "x"))
            .await
            .unwrap_err();

        assert_eq!(err.downcast_ref::<ChainError>(), Some(&ChainError::Cancelled));
        assert!(rx.try_recv().is_err());
    }
}
