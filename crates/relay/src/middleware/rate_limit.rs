//! Token bucket rate limiting.
//!
//! The bucket lives in the middleware value, so every handler it wraps draws
//! from the same budget. Build one `RateLimit` per budget you want.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::Mutex, time::Instant};
use tracing::warn;

use crate::{
    context::Context,
    delivery::Delivery,
    error::ChainError,
    handler::{BoxHandler, Handler},
    middleware::Middleware,
    response::ResponseWriter,
};

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_per_sec: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Clone)]
pub struct RateLimit {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Arc<Mutex<TokenBucket>>,
}

impl RateLimit {
    /// `burst` deliveries may pass at once; the bucket refills at
    /// `per_second` tokens a second.
    pub fn new(burst: u32, per_second: u32) -> Self {
        let capacity = f64::from(burst);
        Self {
            capacity,
            refill_per_sec: f64::from(per_second),
            bucket: Arc::new(Mutex::new(TokenBucket::new(capacity))),
        }
    }
}

impl Middleware for RateLimit {
    fn wrap(&self, next: BoxHandler) -> BoxHandler {
        Arc::new(RateLimitHandler {
            inner: next,
            limit: self.clone(),
        })
    }
}

struct RateLimitHandler {
    inner: BoxHandler,
    limit: RateLimit,
}

#[async_trait]
impl Handler for RateLimitHandler {
    async fn handle(
        &self,
        ctx: Context,
        rw: ResponseWriter,
        delivery: Delivery,
    ) -> anyhow::Result<()> {
        let admitted = self
            .limit
            .bucket
            .lock()
            .await
            .try_acquire(self.limit.capacity, self.limit.refill_per_sec);

        if !admitted {
            warn!(routing_key = %delivery.routing_key, "rate limit exceeded");
            return Err(ChainError::RateLimited.into());
        }

        self.inner.handle(ctx, rw, delivery).await
    }
}
