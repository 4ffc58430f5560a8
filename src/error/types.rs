use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::logging::current_request_id;
use crate::services::extractor::ExtractionError;
use crate::services::gemini::LlmError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing model API credential")]
    MissingCredential,

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Request body exceeds the upload limit")]
    BodyTooLarge,

    #[error("Unsupported media type: {media_type} (expected a PDF or DOCX document)")]
    UnsupportedMediaType { media_type: String },

    #[error("Document could not be read: {message}")]
    CorruptDocument { message: String },

    #[error("No text could be extracted from {file_name}")]
    EmptyDocument { file_name: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Rate limit exceeded: maximum concurrent requests reached")]
    RateLimitExceeded,

    #[error("Model request failed: {message}")]
    ModelRequestFailed { message: String },

    #[error("Model reply is not valid JSON: {message}")]
    MalformedModelReply { message: String },

    #[error("Model reply does not match the expected schema: {message}")]
    ModelSchemaViolation { message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "MISSING_CREDENTIAL",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::BodyTooLarge => "FILE_TOO_LARGE",
            AppError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            AppError::CorruptDocument { .. } => "CORRUPT_DOCUMENT",
            AppError::EmptyDocument { .. } => "EMPTY_DOCUMENT",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::ModelRequestFailed { .. } => "MODEL_REQUEST_FAILED",
            AppError::MalformedModelReply { .. } => "MALFORMED_MODEL_REPLY",
            AppError::ModelSchemaViolation { .. } => "MODEL_SCHEMA_VIOLATION",
            AppError::Timeout => "REQUEST_TIMEOUT",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingCredential => StatusCode::UNAUTHORIZED,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::CorruptDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::ModelRequestFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::MalformedModelReply { .. } => StatusCode::BAD_GATEWAY,
            AppError::ModelSchemaViolation { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = current_request_id().unwrap_or_else(|| Uuid::new_v4().to_string());
        let timestamp = chrono::Utc::now().to_rfc3339();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::UnsupportedMediaType(media_type) => {
                AppError::UnsupportedMediaType { media_type }
            }
            ExtractionError::Empty { file_name } => AppError::EmptyDocument { file_name },
            ExtractionError::Task(message) => AppError::Internal { message },
            other => AppError::CorruptDocument {
                message: other.to_string(),
            },
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => AppError::Timeout,
            LlmError::MalformedReply(e) => AppError::MalformedModelReply {
                message: e.to_string(),
            },
            LlmError::Schema(message) => AppError::ModelSchemaViolation { message },
            other => AppError::ModelRequestFailed {
                message: other.to_string(),
            },
        }
    }
}

// Helper methods for creating specific errors
impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
