use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::models::evaluation::FIELD_NAMES;
use crate::models::EvaluationRequest;

/// Compact JSON with a space after every `,` and `:`, e.g.
/// `{"title": 20, "skills": 30}` and `["Leadership", "Collaboration"]`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

pub fn to_prompt_json<T>(value: &T) -> serde_json::Result<String>
where
    T: ?Sized + Serialize,
{
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| <serde_json::Error as serde::ser::Error>::custom(e))
}

/// The structure the model is asked to reply with. Score fields carry a
/// `"%"` hint, free-text fields an empty string.
pub fn response_schema() -> String {
    let fields: Vec<String> = FIELD_NAMES
        .iter()
        .map(|name| {
            let hint = if name.ends_with("Score") || name.ends_with("Match") { "%" } else { "" };
            format!("\"{}\": \"{}\"", name, hint)
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// Renders the evaluation instructions. Résumé and job description are
/// inserted verbatim.
pub fn compose_prompt(resume_text: &str, request: &EvaluationRequest) -> serde_json::Result<String> {
    let weights = to_prompt_json(&request.weights)?;
    let quantifiable_areas = to_prompt_json(&request.quantifiable_areas)?;

    Ok(format!(
        r#"
Act as a skilled, highly experienced ATS (Applicant Tracking System) reviewer.
Your task is to evaluate the resume against the given job description.
The job market is very competitive, so give the best possible guidance for
improving the resume. Assign percentage match scores based on the job
description and identify the missing keywords with high accuracy.
Weigh each criterion by the importance given in "weights" (0-100 each), and look
for quantifiable results (numbers, percentages, team sizes) in the areas listed
under "quantifiable_areas".

resume: {resume}
description: {description}
weights: {weights}
quantifiable_areas: {quantifiable_areas}

Respond with one single JSON object and nothing else, using this structure:
{schema}
"#,
        resume = resume_text,
        description = request.job_description,
        weights = weights,
        quantifiable_areas = quantifiable_areas,
        schema = response_schema(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Criterion, QuantifiableArea, Weights};

    fn default_request(areas: Vec<QuantifiableArea>) -> EvaluationRequest {
        EvaluationRequest::new("Senior Rust engineer, 5+ years", Weights::default(), areas)
    }

    #[test]
    fn serializes_weights_in_criterion_order() {
        let json = to_prompt_json(&Weights::default()).unwrap();
        assert_eq!(
            json,
            r#"{"title": 20, "experience": 20, "skills": 20, "education": 20, "quantifiable_results": 20}"#
        );
    }

    #[test]
    fn serializes_areas_with_labels() {
        let json = to_prompt_json(&vec![QuantifiableArea::Leadership, QuantifiableArea::CostReduction]).unwrap();
        assert_eq!(json, r#"["Leadership", "Cost Reduction"]"#);
        assert_eq!(to_prompt_json(&Vec::<QuantifiableArea>::new()).unwrap(), "[]");
    }

    #[test]
    fn prompt_contains_serialized_inputs() {
        let prompt = compose_prompt("Jane Doe\nRust developer", &default_request(vec![QuantifiableArea::Leadership])).unwrap();

        assert!(prompt.contains(
            r#"weights: {"title": 20, "experience": 20, "skills": 20, "education": 20, "quantifiable_results": 20}"#
        ));
        assert!(prompt.contains(r#"quantifiable_areas: ["Leadership"]"#));
        assert!(prompt.contains("resume: Jane Doe\nRust developer"));
        assert!(prompt.contains("description: Senior Rust engineer, 5+ years"));
    }

    #[test]
    fn prompt_reflects_custom_weights() {
        let weights = Weights::default()
            .with(Criterion::Skills, 50)
            .with(Criterion::Title, 0);
        let request = EvaluationRequest::new("", weights, []);
        let prompt = compose_prompt("resume", &request).unwrap();
        assert!(prompt.contains(r#""title": 0"#));
        assert!(prompt.contains(r#""skills": 50"#));
    }

    #[test]
    fn prompt_embeds_every_schema_field() {
        let prompt = compose_prompt("resume", &default_request(vec![])).unwrap();
        for name in FIELD_NAMES {
            assert!(prompt.contains(&format!("\"{}\"", name)), "missing {}", name);
        }
        assert!(prompt.contains(r#""OverallScore": "%""#));
        assert!(prompt.contains(r#""CandidateName": """#));
    }

    #[test]
    fn braces_in_resume_are_left_alone() {
        let prompt = compose_prompt("{description} {weights}", &default_request(vec![])).unwrap();
        assert!(prompt.contains("resume: {description} {weights}"));
    }
}
