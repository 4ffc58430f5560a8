//! The scorecard the model returns, validated into typed fields.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Field names of the reply schema, in the order they are requested.
pub const FIELD_NAMES: [&str; 12] = [
    "CandidateName",
    "OverallScore",
    "ExperienceScore",
    "AdditionalExperienceNeeded",
    "SkillsScore",
    "AdditionalSkillsNeeded",
    "EducationMatch",
    "AdditionalEducationNeeded",
    "CertificationMatch",
    "AdditionalCertificationsNeeded",
    "QuantifiableResultsMatch",
    "AreasNeedingImprovement",
];

/// A percentage as reported by the model. Keeps the original text for
/// display next to the parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Percentage {
    raw: String,
    value: f64,
}

impl Percentage {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
        let value: f64 = number
            .parse()
            .map_err(|_| format!("{:?} is not a percentage", raw))?;
        if !value.is_finite() {
            return Err(format!("{:?} is not a finite percentage", raw));
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            value,
        })
    }

    pub fn from_number(value: f64) -> Self {
        Self {
            raw: format!("{}%", value),
            value,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

struct PercentageVisitor;

impl<'de> Visitor<'de> for PercentageVisitor {
    type Value = Percentage;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a percentage such as \"75%\" or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Percentage, E> {
        Percentage::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Percentage, E> {
        Ok(Percentage::from_number(v as f64))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Percentage, E> {
        Ok(Percentage::from_number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Percentage, E> {
        if v.is_finite() {
            Ok(Percentage::from_number(v))
        } else {
            Err(E::custom("percentage must be finite"))
        }
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PercentageVisitor)
    }
}

/// Models often answer list-valued questions with arrays; those are joined
/// into one line. Null means the field is unavailable.
fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                })
                .collect();
            Ok(Some(parts.join(", ")))
        }
        Value::Object(_) => Err(de::Error::custom("expected text, found an object")),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationResult {
    #[serde(default, deserialize_with = "text_field")]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub overall_score: Option<Percentage>,
    #[serde(default)]
    pub experience_score: Option<Percentage>,
    #[serde(default, deserialize_with = "text_field")]
    pub additional_experience_needed: Option<String>,
    #[serde(default)]
    pub skills_score: Option<Percentage>,
    #[serde(default, deserialize_with = "text_field")]
    pub additional_skills_needed: Option<String>,
    #[serde(default)]
    pub education_match: Option<Percentage>,
    #[serde(default, deserialize_with = "text_field")]
    pub additional_education_needed: Option<String>,
    #[serde(default)]
    pub certification_match: Option<Percentage>,
    #[serde(default, deserialize_with = "text_field")]
    pub additional_certifications_needed: Option<String>,
    #[serde(default)]
    pub quantifiable_results_match: Option<Percentage>,
    #[serde(default, deserialize_with = "text_field")]
    pub areas_needing_improvement: Option<String>,
}

impl EvaluationResult {
    /// Validates a parsed reply against the schema. Missing fields are
    /// tolerated; wrong shapes and malformed percentages are not, and neither
    /// is a reply that carries none of the expected fields.
    pub fn from_reply(value: Value) -> Result<Self, String> {
        let object = match &value {
            Value::Object(map) => map,
            other => return Err(format!("expected a JSON object, found {}", json_kind(other))),
        };

        if !FIELD_NAMES.iter().any(|name| object.contains_key(*name)) {
            return Err(format!(
                "reply contains none of the expected fields ({})",
                FIELD_NAMES.join(", ")
            ));
        }

        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_percentages_with_and_without_sign() {
        assert_eq!(Percentage::parse("75%").unwrap().value(), 75.0);
        assert_eq!(Percentage::parse(" 82.5 % ").unwrap().value(), 82.5);
        assert_eq!(Percentage::parse("60").unwrap().value(), 60.0);
        assert_eq!(Percentage::parse(" 75% ").unwrap().as_str(), "75%");
        assert!(Percentage::parse("%").is_err());
        assert!(Percentage::parse("high").is_err());
        assert!(Percentage::parse("NaN%").is_err());
    }

    #[test]
    fn only_one_trailing_sign_is_accepted() {
        assert!(Percentage::parse("%75").is_err());
        assert!(Percentage::parse("75%%").is_err());
        assert!(Percentage::parse("% 75").is_err());
    }

    #[test]
    fn full_reply_validates() {
        let reply = json!({
            "CandidateName": "Jane Doe",
            "OverallScore": "78%",
            "ExperienceScore": "75%",
            "AdditionalExperienceNeeded": "Two more years of backend work",
            "SkillsScore": "90%",
            "AdditionalSkillsNeeded": "",
            "EducationMatch": "100%",
            "AdditionalEducationNeeded": "",
            "CertificationMatch": "40%",
            "AdditionalCertificationsNeeded": ["AWS SA", "CKA"],
            "QuantifiableResultsMatch": "50%",
            "AreasNeedingImprovement": "Add revenue figures"
        });

        let result = EvaluationResult::from_reply(reply).unwrap();
        assert_eq!(result.candidate_name.as_deref(), Some("Jane Doe"));
        assert_eq!(result.experience_score.as_ref().map(Percentage::value), Some(75.0));
        assert_eq!(result.additional_certifications_needed.as_deref(), Some("AWS SA, CKA"));
    }

    #[test]
    fn missing_and_null_fields_are_unavailable() {
        let result = EvaluationResult::from_reply(json!({
            "OverallScore": 64,
            "SkillsScore": null,
            "SomethingElse": true
        }))
        .unwrap();

        assert_eq!(result.overall_score.as_ref().map(Percentage::as_str), Some("64%"));
        assert!(result.skills_score.is_none());
        assert!(result.candidate_name.is_none());
    }

    #[test]
    fn rejects_non_object_replies() {
        let err = EvaluationResult::from_reply(json!(["75%"])).unwrap_err();
        assert!(err.contains("an array"));
    }

    #[test]
    fn rejects_replies_without_known_fields() {
        let err = EvaluationResult::from_reply(json!({"score": "75%"})).unwrap_err();
        assert!(err.contains("none of the expected fields"));
    }

    #[test]
    fn rejects_malformed_percentages() {
        let err = EvaluationResult::from_reply(json!({"ExperienceScore": "strong"})).unwrap_err();
        assert!(err.contains("not a percentage"));
    }

    #[test]
    fn rejects_object_valued_text() {
        assert!(EvaluationResult::from_reply(json!({"CandidateName": {"first": "Jane"}})).is_err());
    }

    #[test]
    fn serializes_back_to_schema_names() {
        let result = EvaluationResult {
            candidate_name: Some("Jane".to_string()),
            experience_score: Some(Percentage::parse("85%").unwrap()),
            ..EvaluationResult::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["CandidateName"], "Jane");
        assert_eq!(value["ExperienceScore"], "85%");
        assert!(value["SkillsScore"].is_null());
    }
}
