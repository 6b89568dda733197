//! Routing table from routing key to composed handler.
//!
//! Per-route middlewares are composed when the route is registered. Global
//! middlewares are composed around every route once, in [`Router::build`], so
//! they always end up outermost.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    chain::{Chain, chain},
    context::Context,
    delivery::Delivery,
    error::ChainError,
    handler::{BoxHandler, Handler},
    middleware::{BoxMiddleware, Middleware},
    response::ResponseWriter,
};

#[derive(Default)]
pub struct Router {
    routes: HashMap<String, BoxHandler>,
    global: Chain,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, key: impl Into<String>, handler: BoxHandler) -> Self {
        let key = key.into();
        if self.routes.insert(key.clone(), handler).is_some() {
            warn!(routing_key = %key, "handler replaced");
        }
        self
    }

    /// Registers `handler` wrapped in `middlewares`, first one outermost.
    pub fn route_with(
        self,
        key: impl Into<String>,
        handler: BoxHandler,
        middlewares: &[BoxMiddleware],
    ) -> Self {
        self.route(key, chain(handler, middlewares))
    }

    /// Adds a middleware applied to every route. Earlier calls wrap later ones.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.global = self.global.layer(middleware);
        self
    }

    pub fn middleware_boxed(mut self, middleware: BoxMiddleware) -> Self {
        self.global = self.global.layer_boxed(middleware);
        self
    }

    pub fn build(self) -> Dispatcher {
        let Self { routes, global } = self;

        let routes = routes
            .into_iter()
            .map(|(key, handler)| {
                debug!(routing_key = %key, layers = global.len(), "composing route");
                (key, global.then(handler))
            })
            .collect();

        Dispatcher {
            routes: Arc::new(routes),
        }
    }
}

/// Built routing table. Cheap to clone; every clone shares the same handlers.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Arc<HashMap<String, BoxHandler>>,
}

impl Dispatcher {
    pub fn get(&self, key: &str) -> Option<&BoxHandler> {
        self.routes.get(key)
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        match self.routes.get(&delivery.routing_key) {
            Some(handler) => handler.handle(ctx, rw, delivery).await,
            None => Err(ChainError::NoRoute(delivery.routing_key).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{handler::handler_fn, middleware_fn};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, name: &'static str) -> BoxHandler {
        let log = log.clone();
        handler_fn(move |_ctx, _rw, _delivery| {
            log.lock().unwrap().push(name.to_string());
            async { anyhow::Ok(()) }
        })
    }

    fn tagging(log: &Log, name: &'static str) -> BoxMiddleware {
        let log = log.clone();
        middleware_fn(move |next: BoxHandler| {
            let log = log.clone();
            handler_fn(move |ctx, rw, delivery| {
                log.lock().unwrap().push(name.to_string());
                let next = next.clone();
                async move { next.handle(ctx, rw, delivery).await }
            })
        })
    }

    async fn dispatch(dispatcher: &Dispatcher, key: &str) -> anyhow::Result<()> {
        dispatcher
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new(key, ""),
            )
            .await
    }

    #[tokio::test]
    async fn test_dispatches_by_routing_key() {
        let log = Log::default();
        let dispatcher = Router::new()
            .route("a", recording(&log, "A"))
            .route("b", recording(&log, "B"))
            .build();

        dispatch(&dispatcher, "b").await.unwrap();
        dispatch(&dispatcher, "a").await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["B", "A"]);
        assert_eq!(dispatcher.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_key_is_no_route() {
        let dispatcher = Router::new().build();

        let err = dispatch(&dispatcher, "missing").await.unwrap_err();

        assert!(dispatcher.is_empty());
        assert_eq!(
            err.downcast_ref::<ChainError>(),
            Some(&ChainError::NoRoute("missing".into()))
        );
    }

    #[tokio::test]
    async fn test_global_wraps_per_route() {
        let log = Log::default();
        let dispatcher = Router::new()
            .route_with("a", recording(&log, "T"), &[tagging(&log, "local")])
            .middleware_boxed(tagging(&log, "g1"))
            .middleware_boxed(tagging(&log, "g2"))
            .build();

        dispatch(&dispatcher, "a").await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["g1", "g2", "local", "T"]);
    }

    #[tokio::test]
    async fn test_reregistering_replaces_handler() {
        let log = Log::default();
        let dispatcher = Router::new()
            .route("a", recording(&log, "old"))
            .route("a", recording(&log, "new"))
            .build();

        dispatch(&dispatcher, "a").await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["new"]);
        assert_eq!(dispatcher.routes().collect::<Vec<_>>(), vec!["a"]);
    }
}
