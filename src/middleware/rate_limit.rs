use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

/// Caps the number of evaluations in flight. Each one holds a permit from
/// the moment its request is admitted until the response is produced.
pub struct RequestLimiter {
    semaphore: Semaphore,
    total_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterMetrics {
    pub total_requests: u64,
    pub rejected_requests: u64,
    pub available_permits: usize,
}

impl RequestLimiter {
    pub fn new(max_concurrent_requests: usize) -> Self {
        info!(max_concurrent_requests, "Initializing request limiter");
        Self {
            semaphore: Semaphore::new(max_concurrent_requests),
            total_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    pub fn try_acquire(&self) -> Result<SemaphorePermit<'_>, AppError> {
        let total_requests = self.total_requests.fetch_add(1, Ordering::Relaxed) + 1;

        self.semaphore.try_acquire().map_err(|_| {
            let rejected = self.rejected_requests.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                total_requests,
                rejected_requests = rejected,
                "Rate limit exceeded - too many concurrent requests"
            );
            AppError::RateLimitExceeded
        })
    }

    pub fn metrics(&self) -> LimiterMetrics {
        LimiterMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            available_permits: self.semaphore.available_permits(),
        }
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let _permit = state.limiter.try_acquire()?;

    debug!(
        path = path,
        available_permits = state.limiter.metrics().available_permits,
        "Request permit acquired"
    );

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_when_permits_are_exhausted() {
        let limiter = RequestLimiter::new(1);
        let first = limiter.try_acquire().unwrap();
        assert!(matches!(limiter.try_acquire(), Err(AppError::RateLimitExceeded)));

        drop(first);
        assert!(limiter.try_acquire().is_ok());

        let metrics = limiter.metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.rejected_requests, 1);
        assert_eq!(metrics.available_permits, 1);
    }
}
