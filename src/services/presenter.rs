//! Turns a validated scorecard into labelled report lines.

use crate::models::{EvaluationResult, Percentage, ReportLine};

/// Scores strictly below this get their "needed" line shown.
pub const SCORE_THRESHOLD: f64 = 80.0;

/// Shown for any field the model left out.
pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub lines: Vec<ReportLine>,
}

impl Report {
    pub fn line(&self, label: &str) -> Option<&ReportLine> {
        self.lines.iter().find(|line| line.label == label)
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n", self.title);
        for line in &self.lines {
            out.push_str(&format!("**{}**: {}\n", line.label, line.value));
        }
        out
    }
}

pub fn needs_improvement(score: Option<&Percentage>) -> bool {
    score.is_some_and(|s| s.value() < SCORE_THRESHOLD)
}

fn text_value(field: Option<&String>) -> String {
    field.cloned().unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn score_value(field: Option<&Percentage>) -> String {
    field
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn present(title: &str, result: &EvaluationResult) -> Report {
    let mut lines = vec![
        ReportLine::new("Candidate Name", text_value(result.candidate_name.as_ref())),
        ReportLine::new("Overall Score", score_value(result.overall_score.as_ref())),
    ];

    let gated = [
        (
            "Experience Score",
            &result.experience_score,
            "Additional Experience Needed",
            &result.additional_experience_needed,
        ),
        (
            "Skills Score",
            &result.skills_score,
            "Additional Skills Needed",
            &result.additional_skills_needed,
        ),
        (
            "Education Match",
            &result.education_match,
            "Additional Education Needed",
            &result.additional_education_needed,
        ),
        (
            "Certification Match",
            &result.certification_match,
            "Additional Certifications Needed",
            &result.additional_certifications_needed,
        ),
        (
            "Quantifiable Results Match",
            &result.quantifiable_results_match,
            "Areas Needing Improvement",
            &result.areas_needing_improvement,
        ),
    ];

    for (score_label, score, needed_label, needed) in gated {
        lines.push(ReportLine::new(score_label, score_value(score.as_ref())));
        if needs_improvement(score.as_ref()) {
            lines.push(ReportLine::new(needed_label, text_value(needed.as_ref())));
        }
    }

    Report {
        title: title.to_string(),
        lines,
    }
}
