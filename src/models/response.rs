use serde::{Deserialize, Serialize};

use crate::models::evaluation::EvaluationResult;
use crate::models::request::{DocumentKind, Weights};

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub success: bool,
    pub data: EvaluateData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct EvaluateData {
    pub file_name: String,
    pub document_kind: DocumentKind,
    pub extracted_characters: usize,
    pub result: EvaluationResult,
    pub report: Vec<ReportLine>,
    pub markdown: String,
}

/// One labelled line of the rendered scorecard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

impl ReportLine {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl EvaluateResponse {
    pub fn new(data: EvaluateData, processing_time_ms: u64) -> Self {
        Self {
            success: true,
            data,
            processing_time_ms,
        }
    }
}

/// Describes the submission form so clients can render it.
#[derive(Debug, Serialize)]
pub struct CriteriaResponse {
    pub weights: Vec<WeightField>,
    pub default_weights: Weights,
    pub quantifiable_areas: Vec<&'static str>,
    pub accepted_media_types: Vec<&'static str>,
    pub score_threshold: f64,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Serialize)]
pub struct WeightField {
    pub criterion: &'static str,
    pub form_field: String,
    pub label: &'static str,
    pub min: u8,
    pub max: u8,
    pub default: u8,
}
