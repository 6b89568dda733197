pub mod chain;
pub mod context;
pub mod delivery;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod response;
pub mod router;

pub use chain::{Chain, chain};
pub use context::Context;
pub use delivery::Delivery;
pub use error::ChainError;
pub use handler::{BoxHandler, Handler, handler_fn};
pub use middleware::{BoxMiddleware, Middleware, middleware_fn};
pub use response::{ChannelResponder, Reply, Responder, ResponseWriter};
pub use router::{Dispatcher, Router};
