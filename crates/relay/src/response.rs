use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::delivery::Delivery;

/// Outbound message produced by a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub routing_key: Option<String>,
    pub correlation_id: Option<String>,
    pub body: Vec<u8>,
}

/// Transport-side sink for replies.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn publish(&self, reply: Reply) -> anyhow::Result<()>;
}

struct Discard;

#[async_trait]
impl Responder for Discard {
    async fn publish(&self, _reply: Reply) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Forwards replies into an mpsc channel.
pub struct ChannelResponder {
    tx: mpsc::Sender<Reply>,
}

impl ChannelResponder {
    pub fn new(tx: mpsc::Sender<Reply>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Responder for ChannelResponder {
    async fn publish(&self, reply: Reply) -> anyhow::Result<()> {
        self.tx
            .send(reply)
            .await
            .map_err(|_| anyhow::anyhow!("reply channel closed"))
    }
}

/// Write-only reply capability handed to every layer of a chain.
///
/// A writer is bound to one delivery: replies inherit its `reply_to` and
/// `correlation_id`. Cloning shares the underlying responder, never the
/// binding of another delivery.
#[derive(Clone)]
pub struct ResponseWriter {
    responder: Arc<dyn Responder>,
    routing_key: Option<String>,
    correlation_id: Option<String>,
}

impl ResponseWriter {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            routing_key: None,
            correlation_id: None,
        }
    }

    /// Writer that drops every reply.
    pub fn discard() -> Self {
        Self::new(Arc::new(Discard))
    }

    pub fn channel(tx: mpsc::Sender<Reply>) -> Self {
        Self::new(Arc::new(ChannelResponder::new(tx)))
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: &Delivery) -> Self {
        self.routing_key = delivery.reply_to.clone();
        self.correlation_id = delivery.correlation_id.clone();
        self
    }

    pub async fn write(&self, body: impl Into<Vec<u8>>) -> anyhow::Result<()> {
        let reply = Reply {
            routing_key: self.routing_key.clone(),
            correlation_id: self.correlation_id.clone(),
            body: body.into(),
        };

        self.responder.publish(reply).await
    }
}

impl std::fmt::Debug for ResponseWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseWriter")
            .field("routing_key", &self.routing_key)
            .field("correlation_id", &self.correlation_id)
            .finish_non_exhaustive()
    }
}
