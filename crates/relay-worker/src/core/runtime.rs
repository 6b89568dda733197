use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

/// Reads from stdin sit on the blocking pool and cannot be interrupted, so
/// the runtime stops waiting for them after this long.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn build() -> std::io::Result<Runtime> {
    Builder::new_multi_thread().enable_all().build()
}

pub fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}
