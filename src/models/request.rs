use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const OCTET_STREAM: &str = "application/octet-stream";

pub const DEFAULT_WEIGHT: u8 = 20;
pub const MAX_WEIGHT: u8 = 100;

/// The document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Pdf, DocumentKind::Docx];

    /// Matches the essence of a media type, ignoring parameters and case.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            PDF_MEDIA_TYPE => Some(DocumentKind::Pdf),
            DOCX_MEDIA_TYPE => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".pdf") {
            Some(DocumentKind::Pdf)
        } else if lower.ends_with(".docx") {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MEDIA_TYPE,
            DocumentKind::Docx => DOCX_MEDIA_TYPE,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("PDF"),
            DocumentKind::Docx => f.write_str("DOCX"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: usize,
    pub content: Bytes,
    pub mime_type: Option<String>,
}

impl UploadedFile {
    pub fn new(name: String, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let size = content.len();
        Self {
            name,
            size,
            content,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: String) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    /// A declared media type wins; the file extension is only consulted when
    /// the client sent none or a generic `application/octet-stream`.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        match self.declared_media_type() {
            Some(media_type) => DocumentKind::from_media_type(media_type),
            None => DocumentKind::from_file_name(&self.name),
        }
    }

    pub fn declared_media_type(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mt| !mt.is_empty() && !mt.eq_ignore_ascii_case(OCTET_STREAM))
    }
}

/// An evaluation criterion the recruiter can weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Title,
    Experience,
    Skills,
    Education,
    QuantifiableResults,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Title,
        Criterion::Experience,
        Criterion::Skills,
        Criterion::Education,
        Criterion::QuantifiableResults,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Criterion::Title => "title",
            Criterion::Experience => "experience",
            Criterion::Skills => "skills",
            Criterion::Education => "education",
            Criterion::QuantifiableResults => "quantifiable_results",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Title => "Job Title Weight",
            Criterion::Experience => "Experience Weight",
            Criterion::Skills => "Skills Weight",
            Criterion::Education => "Education Weight",
            Criterion::QuantifiableResults => "Quantifiable Results Weight",
        }
    }

    /// Name of the multipart form field carrying this weight.
    pub fn form_field(&self) -> String {
        format!("weight_{}", self.key())
    }

    pub fn from_form_field(field: &str) -> Option<Self> {
        let key = field.strip_prefix("weight_")?;
        Criterion::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Relative importance per criterion. Values are advisory and forwarded to
/// the model as-is; they are not required to sum to 100.
///
/// Field order is the serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weights {
    pub title: u8,
    pub experience: u8,
    pub skills: u8,
    pub education: u8,
    pub quantifiable_results: u8,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: DEFAULT_WEIGHT,
            experience: DEFAULT_WEIGHT,
            skills: DEFAULT_WEIGHT,
            education: DEFAULT_WEIGHT,
            quantifiable_results: DEFAULT_WEIGHT,
        }
    }
}

impl Weights {
    pub fn get(&self, criterion: Criterion) -> u8 {
        match criterion {
            Criterion::Title => self.title,
            Criterion::Experience => self.experience,
            Criterion::Skills => self.skills,
            Criterion::Education => self.education,
            Criterion::QuantifiableResults => self.quantifiable_results,
        }
    }

    pub fn with(mut self, criterion: Criterion, value: u8) -> Self {
        let slot = match criterion {
            Criterion::Title => &mut self.title,
            Criterion::Experience => &mut self.experience,
            Criterion::Skills => &mut self.skills,
            Criterion::Education => &mut self.education,
            Criterion::QuantifiableResults => &mut self.quantifiable_results,
        };
        *slot = value;
        self
    }

    /// Parses a weight as submitted by the form. Accepts integers in 0..=100.
    pub fn parse_value(criterion: Criterion, raw: &str) -> Result<u8, String> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            format!("{} must be an integer between 0 and {}, got {:?}", criterion.form_field(), MAX_WEIGHT, raw)
        })?;
        if !(0..=i64::from(MAX_WEIGHT)).contains(&value) {
            return Err(format!(
                "{} must be between 0 and {}, got {}",
                criterion.form_field(),
                MAX_WEIGHT,
                value
            ));
        }
        Ok(value as u8)
    }
}

/// Where the recruiter expects the candidate to show measurable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantifiableArea {
    Leadership,
    #[serde(rename = "Cost Reduction")]
    CostReduction,
    #[serde(rename = "Revenue Generation")]
    RevenueGeneration,
    #[serde(rename = "Time Saving")]
    TimeSaving,
    Collaboration,
}

impl QuantifiableArea {
    pub const ALL: [QuantifiableArea; 5] = [
        QuantifiableArea::Leadership,
        QuantifiableArea::CostReduction,
        QuantifiableArea::RevenueGeneration,
        QuantifiableArea::TimeSaving,
        QuantifiableArea::Collaboration,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            QuantifiableArea::Leadership => "Leadership",
            QuantifiableArea::CostReduction => "Cost Reduction",
            QuantifiableArea::RevenueGeneration => "Revenue Generation",
            QuantifiableArea::TimeSaving => "Time Saving",
            QuantifiableArea::Collaboration => "Collaboration",
        }
    }
}

impl FromStr for QuantifiableArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QuantifiableArea::ALL
            .into_iter()
            .find(|area| area.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let allowed: Vec<&str> = QuantifiableArea::ALL.iter().map(|a| a.label()).collect();
                format!("Unknown quantifiable area {:?}; expected one of {}", s, allowed.join(", "))
            })
    }
}

impl fmt::Display for QuantifiableArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The model API key for one submission. Never logged.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiCredential(<redacted>)")
    }
}

/// Everything a single submission needs besides the résumé itself.
/// Built once from the form and passed down the pipeline unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub job_description: String,
    pub weights: Weights,
    pub quantifiable_areas: Vec<QuantifiableArea>,
}

impl EvaluationRequest {
    /// Duplicate areas collapse; first-selection order is kept.
    pub fn new(
        job_description: impl Into<String>,
        weights: Weights,
        areas: impl IntoIterator<Item = QuantifiableArea>,
    ) -> Self {
        let mut quantifiable_areas = Vec::new();
        for area in areas {
            if !quantifiable_areas.contains(&area) {
                quantifiable_areas.push(area);
            }
        }

        Self {
            job_description: job_description.into(),
            weights,
            quantifiable_areas,
        }
    }
}
