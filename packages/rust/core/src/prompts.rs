//! Prompt templates for the three model-backed calls.

use interviewprep_shared::{MAX_CUSTOM_QUESTIONS, SourceRecord};

/// Upper bound on serialized source data embedded in a prompt.
const MAX_SOURCE_CHARS: usize = 12_000;

/// Prompt for the synthesized preparation guide.
pub fn synthesis_prompt(record: &SourceRecord) -> String {
    format!(
        r#"You are an expert interview preparation consultant. Based on the following interview data for {company} ({role}), create a comprehensive interview preparation guide.

Interview data:
{data}

Respond with a single JSON object with these keys:
- "overview": interview process overview (string)
- "technical_areas": key technical areas to focus on (list of strings)
- "questions": common technical and behavioral questions (list of strings)
- "strategy": preparation strategy (string)
- "timeline": timeline recommendations (string)
- "tips": success tips (list of strings)

Make it actionable and specific to the company and role."#,
        company = record.company_name,
        role = record.role,
        data = truncate_content(&record_json(record), MAX_SOURCE_CHARS),
    )
}

/// Prompt for the custom question set.
pub fn questions_prompt(company: &str, role: &str, experience_level: &str) -> String {
    format!(
        r#"Generate {MAX_CUSTOM_QUESTIONS} specific interview questions for a {role} position at {company} for someone with {experience_level} experience level.

Include:
- 3 technical questions specific to the role
- 3 behavioral questions relevant to company culture
- 2 system design questions (if applicable)
- 2 situational questions

Format as a JSON list of strings."#
    )
}

/// Prompt for the study plan.
pub fn study_plan_prompt(record: &SourceRecord, days: u32) -> String {
    format!(
        r#"Create a {days}-day interview preparation plan for a {role} interview at {company}, based on this interview data:

{data}

Structure the plan as:
- Daily goals and tasks
- Resource recommendations
- Practice schedule
- Mock interview timeline"#,
        role = record.role,
        company = record.company_name,
        data = truncate_content(&record_json(record), MAX_SOURCE_CHARS),
    )
}

fn record_json(record: &SourceRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_default()
}

/// Truncate to at most `max_chars` bytes on a char boundary.
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }
    let mut end = max_chars;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n\n[... data truncated ...]", &content[..end])
}
