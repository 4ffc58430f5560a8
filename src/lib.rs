//! Resume Matcher Service
//!
//! Scores a candidate résumé (PDF or DOCX) against a job description by
//! extracting its text, composing an evaluation prompt with recruiter-chosen
//! weights, and asking a hosted Gemini model for a structured scorecard.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::build_router;
pub use state::AppState;
