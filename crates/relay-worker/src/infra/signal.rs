use async_trait::async_trait;
use tokio::signal::unix::{SignalKind, signal};

use crate::domain::{ShutdownKind, SignalHandler};

#[derive(Debug, Default)]
pub struct UnixSignalHandler;

impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalHandler for UnixSignalHandler {
    async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        let kind = tokio::select! {
            _ = sigterm.recv() => ShutdownKind::Terminate,
            _ = sigint.recv() => ShutdownKind::Interrupt,
            _ = sighup.recv() => ShutdownKind::Hangup,
        };

        Ok(kind)
    }
}
