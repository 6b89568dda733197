use async_trait::async_trait;
use relay::{Context, Delivery, Handler, ResponseWriter};

#[non_exhaustive]
#[derive(Debug, Default)]
pub struct PingHandler;

impl PingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for PingHandler {
    async fn handle(
        &self,
        _ctx: Context,
        rw: ResponseWriter,
        _delivery: Delivery,
    ) -> anyhow::Result<()> {
        rw.write("pong").await
    }
}
