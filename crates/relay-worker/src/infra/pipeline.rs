use std::{sync::Arc, time::Duration};

use relay::{
    BoxMiddleware, Dispatcher, Router,
    middleware::{Auth, Logger, RateLimit, Retry, Timeout, Trace},
};

use crate::infra::{
    config::Settings,
    handlers::{EchoHandler, PingHandler},
};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Routing table served by the worker.
///
/// Global layers, outermost first: trace, logger, auth (when a token is
/// configured), rate limit, timeout. `echo` additionally retries.
pub fn build_dispatcher(settings: &Settings) -> Dispatcher {
    let mut router = Router::new()
        .middleware(Trace::new())
        .middleware(Logger::new());

    if let Some(token) = &settings.auth_token {
        router = router.middleware(Auth::token(token.clone()));
    }

    let retry: BoxMiddleware = Arc::new(
        Retry::new(settings.retry_attempts)
            .with_backoff(settings.retry_base_delay, MAX_RETRY_DELAY),
    );

    router
        .middleware(RateLimit::new(
            settings.rate_limit_burst,
            settings.rate_limit_per_sec,
        ))
        .middleware(Timeout::new(settings.handler_timeout))
        .route_with("echo", Arc::new(EchoHandler::new()), &[retry])
        .route("ping", Arc::new(PingHandler::new()))
        .build()
}

#[cfg(test)]
mod tests {
    use relay::{ChainError, Context, Delivery, Handler, ResponseWriter, middleware::auth::AUTHORIZATION};
    use tokio::sync::mpsc;

    use super::*;

    fn settings() -> Settings {
        Settings {
            concurrency: 4,
            handler_timeout: Duration::from_secs(1),
            rate_limit_burst: 10,
            rate_limit_per_sec: 10,
            retry_attempts: 2,
            retry_base_delay: Duration::from_millis(1),
            auth_token: None,
        }
    }

    #[tokio::test]
    async fn test_routes_registered() {
        let dispatcher = build_dispatcher(&settings());

        let mut routes: Vec<_> = dispatcher.routes().collect();
        routes.sort();
        assert_eq!(routes, vec!["echo", "ping"]);
    }

    #[tokio::test]
    async fn test_ping_replies_pong() {
        let dispatcher = build_dispatcher(&settings());
        let (tx, mut rx) = mpsc::channel(1);

        dispatcher
            .handle(
                Context::background(),
                ResponseWriter::channel(tx),
                Delivery::new("ping", ""),
            )
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().body, b"pong");
    }

    #[tokio::test]
    async fn test_auth_enforced_when_configured() {
        let dispatcher = build_dispatcher(&Settings {
            auth_token: Some("s3cret".into()),
            ..settings()
        });

        let denied = dispatcher
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("ping", ""),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            denied.downcast_ref::<ChainError>(),
            Some(ChainError::Unauthorized(_))
        ));

        let allowed = dispatcher
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("ping", "").with_header(AUTHORIZATION, "s3cret"),
            )
            .await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_shared_between_routes() {
        let dispatcher = build_dispatcher(&Settings {
            rate_limit_burst: 1,
            rate_limit_per_sec: 0,
            ..settings()
        });

        let first = dispatcher
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("ping", ""),
            )
            .await;
        let second = dispatcher
            .handle(
                Context::background(),
                ResponseWriter::discard(),
                Delivery::new("echo", "hi"),
            )
            .await;

        assert!(first.is_ok());
        assert_eq!(
            second.unwrap_err().downcast_ref::<ChainError>(),
            Some(&ChainError::RateLimited)
        );
    }
}
