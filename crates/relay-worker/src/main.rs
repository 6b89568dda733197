mod core;
mod domain;
mod infra;

use relay::Context;
use tracing::info;

use crate::core::{App, runtime};
use crate::domain::ShutdownKind;
use crate::infra::{
    Config, LogGuard, Settings, StdinFetcher, UnixSignalHandler, consumer::Consumer,
    pipeline::build_dispatcher,
};

const DEFAULT_CONFIG_PATH: &str = "./config";

fn main() -> anyhow::Result<()> {
    load_config();
    let _log_guard = LogGuard::init()?;

    let runtime = runtime::build()?;
    let result = runtime.block_on(run());
    runtime::shutdown(runtime);

    let kind = result?;
    info!("worker stopped ({})", kind);
    Ok(())
}

async fn run() -> anyhow::Result<ShutdownKind> {
    let settings = Settings::from_config(&Config::new())?;
    info!(
        concurrency = settings.concurrency,
        timeout_ms = settings.handler_timeout.as_millis() as u64,
        auth = settings.auth_token.is_some(),
        "settings loaded"
    );

    let dispatcher = build_dispatcher(&settings);
    let root = Context::background();
    let consumer =
        Consumer::new(dispatcher, root.clone()).with_concurrency(settings.concurrency);

    let app = App::new(UnixSignalHandler::new(), StdinFetcher::stdin(), consumer, root);
    app.run().await
}

/// Loads a dotenv file into the environment. A missing file is not an error;
/// plain environment variables still apply.
fn load_config() {
    let path = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let _ = dotenv::from_path(path);
}
