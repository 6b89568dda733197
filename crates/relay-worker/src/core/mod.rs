mod app;
pub mod runtime;
pub mod shutdown;

pub use app::App;
pub use shutdown::Shutdowner;
