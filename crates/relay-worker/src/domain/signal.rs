use std::fmt::Display;

use async_trait::async_trait;

/// Why the worker is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    Terminate,
    Interrupt,
    Hangup,
    /// The fetcher ran out of input before any signal arrived.
    InputClosed,
}

impl ShutdownKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownKind::Terminate => "SIGTERM",
            ShutdownKind::Interrupt => "SIGINT",
            ShutdownKind::Hangup => "SIGHUP",
            ShutdownKind::InputClosed => "input closed",
        }
    }
}

impl Display for ShutdownKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait SignalHandler: Send + Sync {
    async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind>;
}
