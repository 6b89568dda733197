use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::{
    context::Context,
    delivery::Delivery,
    error::ChainError,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

pub const AUTHORIZATION: &str = "authorization";

type Authorize = Arc<dyn Fn(&Delivery) -> bool + Send + Sync>;

/// Rejects deliveries that fail a check; rejected deliveries never reach the
/// wrapped handler.
#[derive(Clone)]
pub struct Auth {
    authorize: Authorize,
}

impl Auth {
    pub fn new<F>(authorize: F) -> Self
    where
        F: Fn(&Delivery) -> bool + Send + Sync + 'static,
    {
        Self {
            authorize: Arc::new(authorize),
        }
    }

    /// Requires the `authorization` header to equal `expected`.
    pub fn token(expected: impl Into<String>) -> Self {
        Self::header(AUTHORIZATION, expected)
    }

    pub fn header(name: impl Into<String>, expected: impl Into<String>) -> Self {
        let name = name.into();
        let expected = expected.into();
        Self::new(move |delivery| delivery.header(&name) == Some(expected.as_str()))
    }
}

impl Middleware for Auth {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(AuthHandler {
            inner: next,
            authorize: self.authorize.clone(),
        })
    }
}

struct AuthHandler {
    inner: BoxHandler,
    authorize: Authorize,
}

#[async_trait]
impl Handler for AuthHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        if !(self.authorize)(&delivery) {
            return make_permission_error(&delivery);
        }

        self.inner.handle(ctx, rw, delivery).await
    }
}

fn make_permission_error(delivery: &Delivery) -> anyhow::Result<()> {
    warn!(routing_key = %delivery.routing_key, "delivery rejected by auth");
    Err(ChainError::Unauthorized(format!("permission denied on {}", delivery.routing_key)).into())
}
