pub mod extractor;
pub mod gemini;
pub mod presenter;
pub mod prompt;

pub use extractor::{DocumentExtractor, Extraction, ExtractionError};
pub use gemini::{GeminiClient, LlmError};
pub use presenter::{present, Report, PLACEHOLDER, SCORE_THRESHOLD};
pub use prompt::compose_prompt;
