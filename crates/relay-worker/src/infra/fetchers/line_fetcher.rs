//! Line-oriented delivery source.
//!
//! Each input line is one delivery:
//!
//! ```text
//! <routing_key> [name=value ...] <body...>
//! echo authorization=s3cret correlation_id=42 "hello world"
//! ```
//!
//! Tokens are split shell-style. `correlation_id` and `reply_to` headers also
//! populate the matching delivery fields.

use std::sync::Arc;

use async_trait::async_trait;
use relay::{Delivery, Reply, Responder, ResponseWriter};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Stdin},
    sync::{Mutex, mpsc},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    core::Shutdowner,
    domain::{fetcher::EventFetcher, models::Inbound},
};

const CHANNEL_SIZE: usize = 100;

pub type StdinFetcher = LineFetcher<Stdin>;

#[non_exhaustive]
pub struct LineFetcher<R> {
    reader: Mutex<Option<R>>,
    responder: Arc<dyn Responder>,
    cancel_token: CancellationToken,
}

impl StdinFetcher {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R> LineFetcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            responder: Arc::new(LogResponder),
            cancel_token: CancellationToken::new(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = responder;
        self
    }
}

#[async_trait]
impl<R> EventFetcher for LineFetcher<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn fetch(&self) -> anyhow::Result<mpsc::Receiver<Inbound>> {
        let reader = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow::anyhow!("line fetcher already started"))?;

        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let cancellation_token = self.cancel_token.clone();
        let writer = ResponseWriter::new(self.responder.clone());

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();

            loop {
                tokio::select! {
                    biased;

                    _ = cancellation_token.cancelled() => {
                        info!("fetcher cancelled, stopping...");
                        break
                    }

                    maybe_line = lines.next_line() => {
                        let line = match maybe_line {
                            Ok(Some(line)) => line,
                            Ok(None) => {
                                info!("input closed");
                                break;
                            }
                            Err(e) => {
                                warn!("read failed: {}", e);
                                break;
                            }
                        };

                        let Some(delivery) = parse_line(&line) else {
                            debug!(line = %line, "skipping unparsable line");
                            continue;
                        };

                        if tx.send(Inbound::new(delivery, writer.clone())).await.is_err() {
                            info!("receiver dropped");
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[async_trait]
impl<R> Shutdowner for LineFetcher<R>
where
    R: Send,
{
    async fn shutdown(&self) -> anyhow::Result<()> {
        self.cancel_token.cancel();
        Ok(())
    }
}

impl<R> Drop for LineFetcher<R> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub fn parse_line(line: &str) -> Option<Delivery> {
    let tokens = shlex::split(line)?;
    let mut tokens = tokens.into_iter().peekable();

    let routing_key = tokens.next()?;
    let mut delivery = Delivery::new(routing_key, Vec::new());

    while let Some((name, value)) = tokens.peek().and_then(|t| header_pair(t)) {
        let (name, value) = (name.to_string(), value.to_string());
        match name.as_str() {
            "correlation_id" => delivery.correlation_id = Some(value.clone()),
            "reply_to" => delivery.reply_to = Some(value.clone()),
            _ => {}
        }
        delivery.headers.insert(name, value);
        tokens.next();
    }

    delivery.body = tokens.collect::<Vec<_>>().join(" ").into_bytes();
    Some(delivery)
}

fn header_pair(token: &str) -> Option<(&str, &str)> {
    token
        .split_once('=')
        .filter(|(name, _)| !name.is_empty() && !name.contains(char::is_whitespace))
}

/// Writes replies to the log instead of a broker.
pub struct LogResponder;

#[async_trait]
impl Responder for LogResponder {
    async fn publish(&self, reply: Reply) -> anyhow::Result<()> {
        info!(
            reply_to = reply.routing_key.as_deref().unwrap_or("-"),
            correlation_id = reply.correlation_id.as_deref().unwrap_or("-"),
            body = %String::from_utf8_lossy(&reply.body),
            "reply"
        );
        Ok(())
    }
}
