use axum::{extract::State, response::Json};

use crate::models::{
    Criterion, CriteriaResponse, DocumentKind, QuantifiableArea, WeightField, Weights, MAX_WEIGHT,
};
use crate::services::SCORE_THRESHOLD;
use crate::state::AppState;

/// Describes the evaluation form: weight sliders, focus areas and accepted uploads.
pub async fn criteria_handler(State(state): State<AppState>) -> Json<CriteriaResponse> {
    let defaults = Weights::default();

    let weights = Criterion::ALL
        .iter()
        .map(|criterion| WeightField {
            criterion: criterion.key(),
            form_field: criterion.form_field(),
            label: criterion.label(),
            min: 0,
            max: MAX_WEIGHT,
            default: defaults.get(*criterion),
        })
        .collect();

    Json(CriteriaResponse {
        weights,
        default_weights: defaults,
        quantifiable_areas: QuantifiableArea::ALL.iter().map(|a| a.label()).collect(),
        accepted_media_types: DocumentKind::ALL.iter().map(|k| k.media_type()).collect(),
        score_threshold: SCORE_THRESHOLD,
        max_file_size_mb: state.config.max_file_size_mb,
    })
}
