pub mod consumer;
pub mod fetcher;
pub mod models;
pub mod signal;

pub use signal::{ShutdownKind, SignalHandler};
