use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time;
use tracing::warn;

use crate::{
    context::Context,
    delivery::Delivery,
    error::is_retryable,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Re-invokes the wrapped handler on failure with exponential backoff.
///
/// Gives up after `max_attempts` calls, on an error that is not retryable, or
/// when the context finishes while waiting between attempts.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Retry {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }
}

impl Middleware for Retry {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(RetryHandler {
            inner: next,
            policy: *self,
        })
    }
}

struct RetryHandler {
    inner: BoxHandler,
    policy: Retry,
}

#[async_trait]
impl Handler for RetryHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        let mut attempt = 1;

        loop {
            let err = match self
                .inner
                .handle(ctx.clone(), rw.clone(), delivery.clone())
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts || !is_retryable(&err) {
                return Err(err);
            }

            let delay = backoff(attempt, self.policy.base_delay, self.policy.max_delay);
            warn!(
                routing_key = %delivery.routing_key,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying delivery: {:#}",
                err
            );

            if let Err(stop) = ctx.run(time::sleep(delay)).await {
                return Err(stop.into());
            }

            attempt += 1;
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at `max`.
pub fn backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u32.saturating_pow(attempt - 1);
    base.saturating_mul(factor).min(max)
}
