//! Core domain types for company/role interview research.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InterviewPrepError, Result};

/// Upper bound on the number of custom questions kept in a report.
pub const MAX_CUSTOM_QUESTIONS: usize = 10;

/// Ordered list of generated interview questions.
pub type CustomQuestionSet = Vec<String>;

// ---------------------------------------------------------------------------
// ReportId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for report identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub Uuid);

impl ReportId {
    /// Generate a new time-sortable report identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReportId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Case-normalized identity of a (company, role) pair.
///
/// "Google" / "Software Engineer" and "google" / "software engineer"
/// produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub company: String,
    pub role: String,
}

impl CacheKey {
    pub fn new(company: &str, role: &str) -> Self {
        Self {
            company: company.trim().to_lowercase(),
            role: role.trim().to_lowercase(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.company, self.role)
    }
}

// ---------------------------------------------------------------------------
// ResearchQuery
// ---------------------------------------------------------------------------

/// A request to research one company/role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub company_name: String,
    pub role: String,
    pub experience_level: String,
    pub days_to_prepare: u32,
}

impl ResearchQuery {
    /// Default role when the caller does not specify one.
    pub const DEFAULT_ROLE: &'static str = "Software Engineer";
    /// Default experience level.
    pub const DEFAULT_EXPERIENCE_LEVEL: &'static str = "Mid-level";
    /// Default preparation window in days.
    pub const DEFAULT_DAYS_TO_PREPARE: u32 = 30;

    /// Build a query for `company_name` with default role, level, and window.
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            role: Self::DEFAULT_ROLE.into(),
            experience_level: Self::DEFAULT_EXPERIENCE_LEVEL.into(),
            days_to_prepare: Self::DEFAULT_DAYS_TO_PREPARE,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_experience_level(mut self, level: impl Into<String>) -> Self {
        self.experience_level = level.into();
        self
    }

    pub fn with_days_to_prepare(mut self, days: u32) -> Self {
        self.days_to_prepare = days;
        self
    }

    /// Cache identity for this query.
    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.company_name, &self.role)
    }

    /// Reject queries the pipeline cannot serve.
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(InterviewPrepError::validation(
                "company name must not be empty",
            ));
        }
        if self.days_to_prepare == 0 {
            return Err(InterviewPrepError::validation(
                "days_to_prepare must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SourcePayload
// ---------------------------------------------------------------------------

/// Structured output of a single data-source fetcher.
///
/// List fields are merged into the shared top-level lists of a
/// [`SourceRecord`]; `details` is stored verbatim under the fetcher's
/// namespaced key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub process_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behavioral_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_urls: Vec<String>,
    /// Source-specific structured data.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl SourcePayload {
    /// A payload that carries nothing is treated like a failed fetch.
    pub fn is_empty(&self) -> bool {
        self.process_steps.is_empty()
            && self.technical_topics.is_empty()
            && self.behavioral_questions.is_empty()
            && self.tips.is_empty()
            && self.difficulty_level.is_none()
            && self.source_urls.is_empty()
            && match &self.details {
                serde_json::Value::Null => true,
                serde_json::Value::Object(map) => map.is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                _ => false,
            }
    }
}

// ---------------------------------------------------------------------------
// SourceRecord
// ---------------------------------------------------------------------------

/// Merged per-company/role evidence used as synthesis input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub company_name: String,
    pub role: String,
    #[serde(default)]
    pub process_steps: Vec<String>,
    #[serde(default)]
    pub technical_topics: Vec<String>,
    #[serde(default)]
    pub behavioral_questions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub difficulty_level: String,
    #[serde(default)]
    pub source_urls: Vec<String>,
    /// Per-source payloads keyed by fetcher name.
    #[serde(default)]
    pub sources: BTreeMap<String, serde_json::Value>,
    pub fetched_at: DateTime<Utc>,
}

impl SourceRecord {
    /// An empty record for `company_name`/`role`, stamped now.
    pub fn new(company_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            role: role.into(),
            process_steps: Vec::new(),
            technical_topics: Vec::new(),
            behavioral_questions: Vec::new(),
            tips: Vec::new(),
            difficulty_level: String::new(),
            source_urls: Vec::new(),
            sources: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey::new(&self.company_name, &self.role)
    }

    /// Names of the sources that contributed to this record.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }
}

// ---------------------------------------------------------------------------
// SynthesizedGuide
// ---------------------------------------------------------------------------

/// Fixed-shape preparation guide produced from a model reply.
///
/// Every field is always present; missing content is an empty string or list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizedGuide {
    pub overview: String,
    pub technical_areas: Vec<String>,
    pub questions: Vec<String>,
    pub strategy: String,
    pub timeline: String,
    pub tips: Vec<String>,
}

impl SynthesizedGuide {
    /// True when no field carries any content.
    pub fn is_empty(&self) -> bool {
        self.overview.trim().is_empty()
            && self.technical_areas.is_empty()
            && self.questions.is_empty()
            && self.strategy.trim().is_empty()
            && self.timeline.trim().is_empty()
            && self.tips.is_empty()
    }
}

// ---------------------------------------------------------------------------
// StudyPlan
// ---------------------------------------------------------------------------

/// A preparation plan. `study_plan` may be prose or a serialized structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub study_plan: String,
    pub duration: u32,
}

// ---------------------------------------------------------------------------
// ResearchReport
// ---------------------------------------------------------------------------

/// The immutable result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub id: ReportId,
    #[serde(flatten)]
    pub query: ResearchQuery,
    pub interview_data: SourceRecord,
    pub ai_synthesis: SynthesizedGuide,
    pub custom_questions: CustomQuestionSet,
    pub study_plan: StudyPlan,
    /// Whether `interview_data` was served from the store.
    #[serde(default)]
    pub cache_hit: bool,
    pub generated_at: DateTime<Utc>,
}

impl ResearchReport {
    pub fn key(&self) -> CacheKey {
        self.query.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_id_roundtrip() {
        let id = ReportId::new();
        let parsed: ReportId = id.to_string().parse().expect("parse ReportId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn cache_key_is_case_insensitive() {
        assert_eq!(
            CacheKey::new("Google", "Software Engineer"),
            CacheKey::new("google", " software engineer ")
        );
        assert_ne!(
            CacheKey::new("Google", "Software Engineer"),
            CacheKey::new("Google", "Data Scientist")
        );
    }

    #[test]
    fn query_defaults_and_validation() {
        let query = ResearchQuery::new("Stripe");
        assert_eq!(query.role, "Software Engineer");
        assert_eq!(query.experience_level, "Mid-level");
        assert_eq!(query.days_to_prepare, 30);
        assert!(query.validate().is_ok());

        assert!(ResearchQuery::new("   ").validate().is_err());
        assert!(
            ResearchQuery::new("Stripe")
                .with_days_to_prepare(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn empty_payload_detection() {
        assert!(SourcePayload::default().is_empty());
        assert!(
            SourcePayload {
                details: serde_json::json!({}),
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !SourcePayload {
                tips: vec!["Practice daily".into()],
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !SourcePayload {
                details: serde_json::json!({ "frequency": "high" }),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn guide_deserializes_with_missing_fields() {
        let guide: SynthesizedGuide =
            serde_json::from_str(r#"{"overview": "Three rounds"}"#).expect("deserialize");
        assert_eq!(guide.overview, "Three rounds");
        assert!(guide.technical_areas.is_empty());
        assert!(guide.tips.is_empty());
        assert!(!guide.is_empty());
        assert!(SynthesizedGuide::default().is_empty());
    }

    #[test]
    fn report_serializes_flat_query_fields() {
        let query = ResearchQuery::new("Google");
        let report = ResearchReport {
            id: ReportId::new(),
            interview_data: SourceRecord::new("Google", "Software Engineer"),
            query,
            ai_synthesis: SynthesizedGuide::default(),
            custom_questions: vec!["Why Google?".into()],
            study_plan: StudyPlan {
                study_plan: "Week 1: arrays".into(),
                duration: 30,
            },
            cache_hit: false,
            generated_at: Utc::now(),
        };

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["company_name"], "Google");
        assert_eq!(value["days_to_prepare"], 30);
        assert_eq!(value["study_plan"]["duration"], 30);
        assert!(value["ai_synthesis"]["technical_areas"].is_array());

        let parsed: ResearchReport = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, report);
    }
}
