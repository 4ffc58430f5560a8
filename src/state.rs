use std::sync::Arc;

use crate::config::Config;
use crate::middleware::rate_limit::RequestLimiter;
use crate::services::GeminiClient;

/// Shared application state injected into route handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: GeminiClient,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = GeminiClient::new(&config)?;
        let limiter = Arc::new(RequestLimiter::new(config.max_concurrent_requests));

        Ok(Self {
            config: Arc::new(config),
            llm,
            limiter,
        })
    }
}
