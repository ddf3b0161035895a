//! Model-backed guide, question and study-plan generation with fallbacks.
//!
//! Every call produces a [`ModelOutcome`]; failures (transport errors,
//! timeouts, unusable content) are recovered with a deterministic fallback,
//! so nothing here returns an error.

use std::sync::Arc;
use std::time::Duration;

use interviewprep_llm::ModelClient;
use interviewprep_shared::{
    CustomQuestionSet, InterviewPrepError, MAX_CUSTOM_QUESTIONS, ResearchQuery, SourceRecord,
    StudyPlan, SynthesizedGuide,
};
use tracing::{debug, instrument, warn};

use crate::normalizer::{Normalizer, strip_code_fence};
use crate::prompts;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one model-backed step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> ModelOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> ModelOutcome<U>) -> ModelOutcome<U> {
        match self {
            Self::Success(value) => f(value),
            Self::Failure(reason) => ModelOutcome::Failure(reason),
        }
    }

    /// Unwrap the value, or build the fallback on failure.
    pub fn recover(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            Self::Success(value) => value,
            Self::Failure(_) => fallback(),
        }
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Runs the three model-backed steps.
#[derive(Clone)]
pub struct Synthesizer {
    model: Arc<dyn ModelClient>,
    timeout: Duration,
    normalizer: Arc<Normalizer>,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            normalizer: Arc::new(Normalizer::new()),
        }
    }

    /// Guide, questions and plan, concurrently.
    #[instrument(skip_all, fields(company = %query.company_name, model = self.model.model_name()))]
    pub async fn run_all(
        &self,
        query: &ResearchQuery,
        record: &SourceRecord,
    ) -> (SynthesizedGuide, CustomQuestionSet, StudyPlan) {
        tokio::join!(
            self.guide(record),
            self.custom_questions(query),
            self.study_plan(record, query.days_to_prepare),
        )
    }

    pub async fn guide(&self, record: &SourceRecord) -> SynthesizedGuide {
        let outcome = self
            .call("synthesis", prompts::synthesis_prompt(record))
            .await
            .and_then(|raw| {
                let guide = self.normalizer.normalize(&raw);
                if guide.is_empty() {
                    ModelOutcome::Failure("reply normalized to an empty guide".into())
                } else {
                    ModelOutcome::Success(guide)
                }
            });
        log_fallback("synthesis", &outcome);
        outcome.recover(|| fallback_guide(record))
    }

    pub async fn custom_questions(&self, query: &ResearchQuery) -> CustomQuestionSet {
        let prompt =
            prompts::questions_prompt(&query.company_name, &query.role, &query.experience_level);
        let outcome = self.call("questions", prompt).await.and_then(|raw| {
            let questions = parse_questions(&raw);
            if questions.is_empty() {
                ModelOutcome::Failure("no questions in reply".into())
            } else {
                ModelOutcome::Success(questions)
            }
        });
        log_fallback("questions", &outcome);
        outcome.recover(|| fallback_questions(&query.company_name, &query.role))
    }

    pub async fn study_plan(&self, record: &SourceRecord, days: u32) -> StudyPlan {
        let outcome = self
            .call("study_plan", prompts::study_plan_prompt(record, days))
            .await
            .and_then(|raw| {
                let text = strip_code_fence(&raw);
                if text.is_empty() {
                    ModelOutcome::Failure("empty study plan".into())
                } else {
                    ModelOutcome::Success(StudyPlan {
                        study_plan: text.to_string(),
                        duration: days,
                    })
                }
            });
        log_fallback("study_plan", &outcome);
        outcome.recover(|| fallback_study_plan(days))
    }

    async fn call(&self, step: &str, prompt: String) -> ModelOutcome<String> {
        match tokio::time::timeout(self.timeout, self.model.complete(&prompt)).await {
            Ok(Ok(reply)) => {
                debug!(step, reply_chars = reply.len(), "model replied");
                ModelOutcome::Success(reply)
            }
            Ok(Err(e)) => ModelOutcome::Failure(e.to_string()),
            Err(_) => ModelOutcome::Failure(
                InterviewPrepError::timeout(format!("model {step}"), self.timeout.as_secs())
                    .to_string(),
            ),
        }
    }
}

fn log_fallback<T>(step: &str, outcome: &ModelOutcome<T>) {
    if let ModelOutcome::Failure(reason) = outcome {
        warn!(step, %reason, "model step failed, using fallback");
    }
}

/// Read a question list from a reply: a JSON string array, else list lines.
pub fn parse_questions(raw: &str) -> CustomQuestionSet {
    let body = strip_code_fence(raw);

    let mut questions: Vec<String> = match serde_json::from_str::<Vec<serde_json::Value>>(body) {
        Ok(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => {
            let lines: Vec<&str> = body.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            let listed: Vec<&str> = lines.iter().copied().filter(|l| is_question_line(l)).collect();
            let chosen = if listed.is_empty() { lines } else { listed };
            chosen
                .into_iter()
                .map(strip_question_marker)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    };

    questions.truncate(MAX_CUSTOM_QUESTIONS);
    questions
}

/// Bullet (`-`, `•`, `*`) or numbered line.
fn is_question_line(line: &str) -> bool {
    line.starts_with(['-', '•', '*']) || line.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn strip_question_marker(line: &str) -> &str {
    line.trim_start_matches(|c: char| {
        matches!(c, '-' | '•' | '*' | '.' | ')') || c.is_ascii_digit() || c.is_whitespace()
    })
    .trim_end()
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

/// Guide built directly from the source record.
pub fn fallback_guide(record: &SourceRecord) -> SynthesizedGuide {
    let company = if record.company_name.trim().is_empty() {
        "Unknown Company"
    } else {
        record.company_name.as_str()
    };

    SynthesizedGuide {
        overview: format!("Interview preparation guide for {company}"),
        technical_areas: record.technical_topics.clone(),
        questions: record.behavioral_questions.clone(),
        strategy: "Focus on technical skills and behavioral preparation".into(),
        timeline: "2-4 weeks recommended preparation time".into(),
        tips: record.tips.clone(),
    }
}

pub fn fallback_questions(company: &str, role: &str) -> CustomQuestionSet {
    vec![
        format!("What interests you about working at {company}?"),
        format!("How would you approach a typical {role} challenge?"),
        "Describe your experience with relevant technologies".into(),
        "How do you handle working in a team environment?".into(),
        "What's your approach to learning new technologies?".into(),
    ]
}

pub fn fallback_study_plan(days: u32) -> StudyPlan {
    StudyPlan {
        study_plan: format!("Structured {days}-day preparation plan with daily goals"),
        duration: days,
    }
}
