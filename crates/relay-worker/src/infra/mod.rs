pub mod config;
pub mod consumer;
pub mod fetchers;
pub mod handlers;
pub mod logging;
pub mod pipeline;
pub mod signal;

pub use config::{Config, Settings};
pub use fetchers::StdinFetcher;
pub use logging::LogGuard;
pub use signal::UnixSignalHandler;
