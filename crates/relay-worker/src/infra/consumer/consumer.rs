use std::sync::Arc;

use anyhow::Error;
use async_trait::async_trait;
use futures::StreamExt;
use relay::{Context, Handler};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info};

use crate::domain::{consumer::EventConsumer, models::Inbound};

pub const DEFAULT_CONCURRENCY: usize = 30;

/// Feeds inbound deliveries to a handler, at most `concurrency` at a time.
///
/// Every delivery gets its own context derived from `root`, so cancelling one
/// delivery never touches another while cancelling `root` reaches them all.
pub struct Consumer<H: Handler> {
    handler: Arc<H>,
    root: Context,
    concurrency: usize,
}

impl<H: Handler> Consumer<H> {
    pub fn new(handler: H, root: Context) -> Self {
        Self {
            handler: Arc::new(handler),
            root,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

#[async_trait]
impl<H: Handler> EventConsumer for Consumer<H> {
    async fn consume(&self, ch: mpsc::Receiver<Inbound>) {
        ReceiverStream::new(ch)
            .map(|inbound| {
                let handler = self.handler.clone();
                let ctx = self.root.child();
                async move {
                    let Inbound { delivery, writer } = inbound;
                    let routing_key = delivery.routing_key.clone();
                    if let Err(e) = handler.handle(ctx, writer, delivery).await {
                        handle_error(&routing_key, e);
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<()>()
            .await;

        info!("consumer drained");
    }
}

fn handle_error(routing_key: &str, e: Error) {
    error!(routing_key = %routing_key, "delivery dropped: {:#}", e);
}
