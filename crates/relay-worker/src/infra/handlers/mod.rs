pub mod echo_handler;
pub mod ping_handler;

pub use echo_handler::EchoHandler;
pub use ping_handler::PingHandler;
