//! GeeksforGeeks interview-experience source.

use async_trait::async_trait;
use interviewprep_shared::{Result, SourcePayload};

use super::{SourceFetcher, slugify};

/// Interview experiences plus general preparation topics and tips.
pub struct GeeksforGeeksFetcher;

#[async_trait]
impl SourceFetcher for GeeksforGeeksFetcher {
    fn name(&self) -> &str {
        "geeksforgeeks"
    }

    async fn fetch(&self, company: &str, role: &str) -> Result<Option<SourcePayload>> {
        Ok(Some(SourcePayload {
            technical_topics: vec![
                "Data Structures and Algorithms".into(),
                "System Design".into(),
                "Object-Oriented Programming".into(),
            ],
            tips: vec![
                "Practice coding problems daily".into(),
                "Understand company culture".into(),
                "Prepare behavioral questions".into(),
            ],
            source_urls: vec![format!(
                "https://www.geeksforgeeks.org/tag/{}/",
                slugify(company)
            )],
            details: serde_json::json!({
                "interview_experiences": [
                    format!("{company} {role} Interview Experience"),
                    format!("{company} Internship Interview Questions"),
                ],
            }),
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contributes_topics_and_tips() {
        let payload = GeeksforGeeksFetcher
            .fetch("Adobe", "Software Engineer")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.technical_topics.len(), 3);
        assert_eq!(payload.tips[0], "Practice coding problems daily");
        assert_eq!(
            payload.details["interview_experiences"][0],
            "Adobe Software Engineer Interview Experience"
        );
    }
}
