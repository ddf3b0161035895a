//! Baseline template source.
//!
//! Seeds process steps, technical topics, behavioral questions, tips, and
//! difficulty from a curated catalog. Companies outside the catalog get a
//! generic template, so this source always produces a payload.

use async_trait::async_trait;
use interviewprep_shared::{Result, SourcePayload};

use super::{SourceFetcher, slugify};

/// Curated per-company interview shape.
struct CompanyTemplate {
    process_steps: &'static [&'static str],
    technical_topics: &'static [&'static str],
    difficulty_level: &'static str,
}

const GOOGLE: CompanyTemplate = CompanyTemplate {
    process_steps: &[
        "Phone/Video Screen with Recruiter",
        "Technical Phone Interview",
        "Onsite Interviews (4-5 rounds)",
        "Hiring Committee Review",
    ],
    technical_topics: &[
        "Algorithms and Data Structures",
        "System Design",
        "Coding in preferred language",
        "Problem-solving approach",
    ],
    difficulty_level: "Very Hard",
};

const AMAZON: CompanyTemplate = CompanyTemplate {
    process_steps: &[
        "Online Assessment",
        "Phone Interview",
        "Virtual Onsite (3-4 rounds)",
        "Bar Raiser Round",
    ],
    technical_topics: &[
        "Leadership Principles",
        "Data Structures",
        "System Design",
        "Behavioral Questions",
    ],
    difficulty_level: "Hard",
};

const MICROSOFT: CompanyTemplate = CompanyTemplate {
    process_steps: &[
        "Recruiter Screen",
        "Technical Phone Screen",
        "Onsite Interviews (4-5 rounds)",
        "Final Review",
    ],
    technical_topics: &[
        "Coding Problems",
        "System Design",
        "Technical Discussion",
        "Culture Fit",
    ],
    difficulty_level: "Hard",
};

const DEFAULT: CompanyTemplate = CompanyTemplate {
    process_steps: &[
        "Initial Screening",
        "Technical Interview",
        "Final Round",
        "Offer Discussion",
    ],
    technical_topics: &[
        "Programming Fundamentals",
        "Problem Solving",
        "Technical Knowledge",
        "Communication Skills",
    ],
    difficulty_level: "Medium",
};

fn template_for(company: &str) -> (&'static CompanyTemplate, bool) {
    match company.trim().to_lowercase().as_str() {
        "google" => (&GOOGLE, true),
        "amazon" => (&AMAZON, true),
        "microsoft" => (&MICROSOFT, true),
        _ => (&DEFAULT, false),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Baseline fetcher backed by the Glassdoor-derived template catalog.
pub struct GlassdoorTemplate;

#[async_trait]
impl SourceFetcher for GlassdoorTemplate {
    fn name(&self) -> &str {
        "glassdoor"
    }

    fn is_baseline(&self) -> bool {
        true
    }

    async fn fetch(&self, company: &str, role: &str) -> Result<Option<SourcePayload>> {
        let (template, curated) = template_for(company);
        let role = if role.trim().is_empty() {
            "Software Engineer"
        } else {
            role.trim()
        };

        Ok(Some(SourcePayload {
            process_steps: owned(template.process_steps),
            technical_topics: owned(template.technical_topics),
            behavioral_questions: vec![
                "Tell me about yourself".into(),
                format!("Why do you want to work at {company}?"),
                "Describe a challenging project you worked on".into(),
                "How do you handle tight deadlines?".into(),
                "Where do you see yourself in 5 years?".into(),
            ],
            tips: vec![
                format!("Research {company}'s culture and values"),
                "Practice coding problems on whiteboard".into(),
                "Prepare STAR method examples".into(),
                "Ask thoughtful questions about the role".into(),
                "Be ready to discuss your projects in detail".into(),
            ],
            difficulty_level: Some(template.difficulty_level.into()),
            source_urls: vec![format!(
                "https://www.glassdoor.com/Interview/{}-interview-questions.htm",
                slugify(company)
            )],
            details: serde_json::json!({
                "role": role,
                "curated": curated,
                "rounds": template.process_steps.len(),
            }),
        }))
    }
}
