use std::time::Duration;

use relay::Context;
use tokio::time::timeout;
use tracing::{error, info};

use crate::{
    core::Shutdowner,
    domain::{ShutdownKind, SignalHandler, consumer::EventConsumer, fetcher::EventFetcher},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App<S, F, C> {
    signal_handler: S,
    fetcher: F,
    consumer: C,
    root: Context,
}

impl<S, F, C> App<S, F, C>
where
    S: SignalHandler,
    F: EventFetcher + Shutdowner,
    C: EventConsumer,
{
    /// `root` must be the context the consumer derives per-delivery contexts
    /// from; it is cancelled when shutdown overruns.
    pub fn new(signal_handler: S, fetcher: F, consumer: C, root: Context) -> Self {
        Self {
            signal_handler,
            fetcher,
            consumer,
            root,
        }
    }

    pub async fn run(self) -> anyhow::Result<ShutdownKind> {
        info!("app running...");

        let Self {
            signal_handler,
            fetcher,
            consumer,
            root,
        } = self;

        let event_ch = fetcher.fetch().await?;
        let mut handle = tokio::spawn(async move {
            consumer.consume(event_ch).await;
        });

        let kind = tokio::select! {
            signal = signal_handler.wait_for_shutdown() => signal?,
            joined = &mut handle => {
                joined?;
                info!("stopping: {}", ShutdownKind::InputClosed);
                return Ok(ShutdownKind::InputClosed);
            }
        };
        info!("received signal {}, stopping", kind);

        fetcher.shutdown().await?;

        match timeout(SHUTDOWN_TIMEOUT, &mut handle).await {
            Ok(res) => {
                res?;
                info!("graceful shutdown complete");
            }
            Err(_) => {
                error!("shutdown timeout exceeded, cancelling in-flight deliveries");
                root.cancel();
                handle.abort();
            }
        }

        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{domain::models::Inbound, infra::fetchers::line_fetcher::LineFetcher};

    struct NeverSignal;

    #[async_trait]
    impl SignalHandler for NeverSignal {
        async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind> {
            std::future::pending().await
        }
    }

    struct ImmediateSignal;

    #[async_trait]
    impl SignalHandler for ImmediateSignal {
        async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind> {
            Ok(ShutdownKind::Terminate)
        }
    }

    struct CountingConsumer {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventConsumer for CountingConsumer {
        async fn consume(&self, mut ch: mpsc::Receiver<Inbound>) {
            while ch.recv().await.is_some() {
                self.seen.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_stops_when_input_closes() {
        let seen = Arc::new(AtomicUsize::new(0));
        let input: &[u8] = b"ping\necho hi\n";

        let app = App::new(
            NeverSignal,
            LineFetcher::new(input),
            CountingConsumer { seen: seen.clone() },
            Context::background(),
        );

        assert_eq!(app.run().await.unwrap(), ShutdownKind::InputClosed);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stops_on_signal_with_open_input() {
        let (_keep_open, reader) = tokio::io::duplex(64);

        let app = App::new(
            ImmediateSignal,
            LineFetcher::new(reader),
            CountingConsumer {
                seen: Arc::new(AtomicUsize::new(0)),
            },
            Context::background(),
        );

        assert_eq!(app.run().await.unwrap(), ShutdownKind::Terminate);
    }
}
