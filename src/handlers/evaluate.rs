use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::current_request_id;
use crate::models::{
    ApiCredential, Criterion, EvaluateData, EvaluateResponse, EvaluationRequest, QuantifiableArea,
    UploadedFile, Weights,
};
use crate::services::{compose_prompt, present, DocumentExtractor};
use crate::state::AppState;

/// A parsed submission: the résumé plus its evaluation settings.
#[derive(Debug)]
pub struct EvaluationForm {
    pub file: UploadedFile,
    pub request: EvaluationRequest,
}

pub async fn evaluate_handler(
    State(state): State<AppState>,
    Extension(credential): Extension<ApiCredential>,
    multipart: Multipart,
) -> AppResult<Json<EvaluateResponse>> {
    let start = Instant::now();
    let request_id = current_request_id().unwrap_or_default();

    info!(request_id = %request_id, "Starting evaluation request");

    let form = match read_evaluation_form(multipart, state.config.max_file_size_mb).await {
        Ok(form) => {
            info!(
                request_id = %request_id,
                file_name = %form.file.name,
                file_size = form.file.size,
                mime_type = ?form.file.mime_type,
                weights = ?form.request.weights,
                quantifiable_areas = ?form.request.quantifiable_areas,
                job_description_chars = form.request.job_description.chars().count(),
                "Evaluation form received"
            );
            form
        }
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Failed to read evaluation form");
            return Err(e);
        }
    };

    let extraction = match DocumentExtractor::new().extract(&form.file).await {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "Text extraction failed");
            return Err(e.into());
        }
    };

    let prompt = compose_prompt(&extraction.text, &form.request)
        .map_err(|e| AppError::internal(format!("Failed to compose prompt: {}", e)))?;
    debug!(request_id = %request_id, prompt_chars = prompt.len(), "Prompt composed");

    let result = match state.llm.evaluate(&prompt, &credential).await {
        Ok(result) => result,
        Err(e) => {
            error!(request_id = %request_id, model = %state.llm.model(), error = %e, "Model evaluation failed");
            return Err(e.into());
        }
    };

    let report = present(&form.file.name, &result);
    let total_time = start.elapsed().as_millis() as u64;

    info!(
        request_id = %request_id,
        total_time_ms = total_time,
        extraction_time_ms = extraction.processing_time_ms,
        overall_score = result.overall_score.as_ref().map(|s| s.as_str()).unwrap_or("N/A"),
        "Evaluation completed successfully"
    );

    let markdown = report.to_markdown();
    let data = EvaluateData {
        file_name: form.file.name,
        document_kind: extraction.kind,
        extracted_characters: extraction.text.chars().count(),
        result,
        report: report.lines,
        markdown,
    };

    Ok(Json(EvaluateResponse::new(data, total_time)))
}

/// Reads the multipart form. Weights default to 20 and must lie in 0..=100;
/// focus areas must come from the fixed list. Unknown fields are ignored.
pub async fn read_evaluation_form(
    mut multipart: Multipart,
    max_file_size_mb: usize,
) -> AppResult<EvaluationForm> {
    let mut file = None;
    let mut job_description = String::new();
    let mut weights = Weights::default();
    let mut areas = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => file = Some(read_file(field, max_file_size_mb).await?),
            "job_description" => job_description = field.text().await.map_err(multipart_error)?,
            "quantifiable_areas" | "quantifiable_areas[]" => {
                let label = field.text().await.map_err(multipart_error)?;
                let area: QuantifiableArea = label.parse().map_err(AppError::validation)?;
                areas.push(area);
            }
            name => match Criterion::from_form_field(name) {
                Some(criterion) => {
                    let raw = field.text().await.map_err(multipart_error)?;
                    let value = Weights::parse_value(criterion, &raw).map_err(AppError::validation)?;
                    weights = weights.with(criterion, value);
                }
                None => debug!(field = name, "Ignoring unknown form field"),
            },
        }
    }

    let file = file.ok_or(AppError::MissingFile)?;

    Ok(EvaluationForm {
        file,
        request: EvaluationRequest::new(job_description, weights, areas),
    })
}

async fn read_file(field: Field<'_>, max_file_size_mb: usize) -> AppResult<UploadedFile> {
    let file_name = field.file_name().unwrap_or("resume").to_string();
    let content_type = field.content_type().map(|ct| ct.to_string());

    let data = field.bytes().await.map_err(multipart_error)?;

    if data.is_empty() {
        return Err(AppError::validation("Uploaded file is empty"));
    }

    let max_size_bytes = max_file_size_mb * 1024 * 1024;
    if data.len() > max_size_bytes {
        warn!(file_size = data.len(), max_size = max_size_bytes, "File size exceeds limit");
        return Err(AppError::FileTooLarge {
            // Rounded up so the reported size never reads as within the limit.
            size: data.len().div_ceil(1024 * 1024),
            limit: max_file_size_mb,
        });
    }

    let mut file = UploadedFile::new(file_name, data);
    if let Some(mime_type) = content_type {
        file = file.with_mime_type(mime_type);
    }

    debug!(
        "Read uploaded file: {} ({} bytes, type: {:?})",
        file.name,
        file.size,
        file.mime_type
    );

    Ok(file)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BodyTooLarge
    } else {
        AppError::validation(format!("Failed to read multipart form: {}", err.body_text()))
    }
}
