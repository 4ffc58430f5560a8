//! Request-scoped layers: request ids and logging for every route, plus the
//! credential check and concurrency limit on the evaluation route.

pub mod auth;
pub mod logging;
pub mod rate_limit;

pub use auth::{credential_from_headers, credential_middleware};
pub use logging::{current_request_id, logging_middleware, REQUEST_ID_HEADER};
pub use rate_limit::{rate_limit_middleware, LimiterMetrics, RequestLimiter};
