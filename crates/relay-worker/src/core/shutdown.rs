use async_trait::async_trait;

/// Stops a delivery source. Once it returns, the source sends nothing more
/// and closes its channel.
#[async_trait]
pub trait Shutdowner: Send + Sync {
    async fn shutdown(&self) -> anyhow::Result<()>;
}
