//! Fan-out over registered fetchers and merge into one [`SourceRecord`].

use std::collections::HashSet;
use std::time::Duration;

use interviewprep_shared::{InterviewPrepError, SourcePayload, SourceRecord};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetchers::FetcherRegistry;

/// Queries every registered fetcher concurrently and merges the results.
///
/// A failing, slow, or empty fetcher is logged and left out of the record;
/// it never aborts the other fetchers.
#[derive(Clone)]
pub struct SourceAggregator {
    registry: FetcherRegistry,
    fetch_timeout: Duration,
}

impl SourceAggregator {
    pub fn new(registry: FetcherRegistry, fetch_timeout: Duration) -> Self {
        Self {
            registry,
            fetch_timeout,
        }
    }

    pub fn registry(&self) -> &FetcherRegistry {
        &self.registry
    }

    /// Build a [`SourceRecord`] for `company`/`role` from all fetchers.
    #[instrument(skip_all, fields(company = %company, role = %role))]
    pub async fn aggregate(&self, company: &str, role: &str) -> SourceRecord {
        let mut handles = Vec::with_capacity(self.registry.len());

        for fetcher in self.registry.fetchers() {
            let fetcher = fetcher.clone();
            let company = company.to_string();
            let role = role.to_string();
            let timeout = self.fetch_timeout;

            handles.push(tokio::spawn(async move {
                tokio::time::timeout(timeout, fetcher.fetch(&company, &role)).await
            }));
        }

        let mut record = SourceRecord::new(company, role);
        let mut seen_urls = HashSet::new();

        // Await in registration order so merge order is deterministic.
        for (fetcher, handle) in self.registry.fetchers().iter().zip(handles) {
            let name = fetcher.name();
            let payload = match handle.await {
                Ok(Ok(Ok(Some(payload)))) if !payload.is_empty() => payload,
                Ok(Ok(Ok(_))) => {
                    debug!(source = name, "source returned no data");
                    continue;
                }
                Ok(Ok(Err(e))) => {
                    warn!(source = name, error = %e, "source fetch failed, skipping");
                    continue;
                }
                Ok(Err(_)) => {
                    let e = InterviewPrepError::timeout(
                        format!("source `{name}`"),
                        self.fetch_timeout.as_secs(),
                    );
                    warn!(source = name, error = %e, "source fetch timed out, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(source = name, error = %e, "source task panicked, skipping");
                    continue;
                }
            };

            merge(&mut record, name, fetcher.is_baseline(), payload, &mut seen_urls);
        }

        info!(
            sources = record.sources.len(),
            registered = self.registry.len(),
            topics = record.technical_topics.len(),
            "sources aggregated"
        );

        record
    }
}

/// Fold one payload into the record.
///
/// Lists are concatenated. `difficulty_level` is set by the baseline source,
/// otherwise only filled by the first contributor when still empty.
fn merge(
    record: &mut SourceRecord,
    name: &str,
    baseline: bool,
    payload: SourcePayload,
    seen_urls: &mut HashSet<String>,
) {
    let namespaced = serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null);

    let SourcePayload {
        process_steps,
        technical_topics,
        behavioral_questions,
        tips,
        difficulty_level,
        source_urls,
        details: _,
    } = payload;

    record.process_steps.extend(process_steps);
    record.technical_topics.extend(technical_topics);
    record.behavioral_questions.extend(behavioral_questions);
    record.tips.extend(tips);

    if let Some(level) = difficulty_level.filter(|l| !l.trim().is_empty()) {
        if baseline || record.difficulty_level.is_empty() {
            record.difficulty_level = level;
        } else {
            debug!(source = name, %level, "difficulty already set, keeping earlier value");
        }
    }

    for raw in source_urls {
        match Url::parse(&raw) {
            Ok(url) => {
                let url = url.to_string();
                if seen_urls.insert(url.clone()) {
                    record.source_urls.push(url);
                }
            }
            Err(e) => debug!(source = name, url = %raw, error = %e, "dropping invalid source URL"),
        }
    }

    record.sources.insert(name.to_string(), namespaced);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use interviewprep_shared::{InterviewPrepError, Result};

    use super::*;
    use crate::fetchers::SourceFetcher;

    /// Fetcher returning a fixed outcome.
    struct StubFetcher {
        name: &'static str,
        baseline: bool,
        outcome: fn() -> Result<Option<SourcePayload>>,
    }

    #[async_trait]
    impl SourceFetcher for StubFetcher {
        fn name(&self) -> &str {
            self.name
        }

        fn is_baseline(&self) -> bool {
            self.baseline
        }

        async fn fetch(&self, _company: &str, _role: &str) -> Result<Option<SourcePayload>> {
            (self.outcome)()
        }
    }

    struct SlowFetcher;

    #[async_trait]
    impl SourceFetcher for SlowFetcher {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch(&self, _company: &str, _role: &str) -> Result<Option<SourcePayload>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some(SourcePayload {
                tips: vec!["too late".into()],
                ..Default::default()
            }))
        }
    }

    fn stub(
        name: &'static str,
        baseline: bool,
        outcome: fn() -> Result<Option<SourcePayload>>,
    ) -> Arc<dyn SourceFetcher> {
        Arc::new(StubFetcher {
            name,
            baseline,
            outcome,
        })
    }

    fn topics(items: &[&str]) -> Result<Option<SourcePayload>> {
        Ok(Some(SourcePayload {
            technical_topics: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }))
    }

    fn aggregator(registry: FetcherRegistry) -> SourceAggregator {
        SourceAggregator::new(registry, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn builtin_sources_for_google() {
        let record = aggregator(FetcherRegistry::new())
            .aggregate("Google", "Software Engineer")
            .await;

        assert_eq!(record.difficulty_level, "Very Hard");
        assert_eq!(
            record.source_names(),
            vec!["geeksforgeeks", "glassdoor", "interviewbit", "leetcode"]
        );
        assert_eq!(record.process_steps.len(), 4);
        // Baseline topics come first, later sources append.
        assert_eq!(record.technical_topics[0], "Algorithms and Data Structures");
        assert!(record.technical_topics.len() > 4);
        assert_eq!(record.source_urls.len(), 4);
    }

    #[tokio::test]
    async fn failed_source_is_omitted() {
        let registry = FetcherRegistry::empty()
            .with(stub("a", false, || topics(&["Graphs"])))
            .with(stub("broken", false, || {
                Err(InterviewPrepError::source_fetch("broken", "connection refused"))
            }))
            .with(stub("c", false, || topics(&["Tries"])));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;

        assert_eq!(record.source_names(), vec!["a", "c"]);
        assert_eq!(record.technical_topics, vec!["Graphs", "Tries"]);
    }

    #[tokio::test]
    async fn empty_and_missing_payloads_are_omitted() {
        let registry = FetcherRegistry::empty()
            .with(stub("none", false, || Ok(None)))
            .with(stub("empty", false, || Ok(Some(SourcePayload::default()))))
            .with(stub("real", false, || topics(&["Heaps"])));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert_eq!(record.source_names(), vec!["real"]);
    }

    #[tokio::test]
    async fn all_sources_failing_yields_empty_record() {
        let registry = FetcherRegistry::empty().with(stub("broken", false, || {
            Err(InterviewPrepError::source_fetch("broken", "boom"))
        }));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert!(record.sources.is_empty());
        assert!(record.difficulty_level.is_empty());
        assert_eq!(record.company_name, "Acme");
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let registry = FetcherRegistry::empty()
            .with(Arc::new(SlowFetcher))
            .with(stub("fast", false, || topics(&["Graphs"])));

        let record = SourceAggregator::new(registry, Duration::from_millis(50))
            .aggregate("Acme", "SWE")
            .await;

        assert_eq!(record.source_names(), vec!["fast"]);
        assert!(record.tips.is_empty());
    }

    #[tokio::test]
    async fn baseline_difficulty_wins() {
        let registry = FetcherRegistry::empty()
            .with(stub("early", false, || {
                Ok(Some(SourcePayload {
                    difficulty_level: Some("Easy".into()),
                    ..Default::default()
                }))
            }))
            .with(stub("template", true, || {
                Ok(Some(SourcePayload {
                    difficulty_level: Some("Hard".into()),
                    ..Default::default()
                }))
            }))
            .with(stub("late", false, || {
                Ok(Some(SourcePayload {
                    difficulty_level: Some("Medium".into()),
                    ..Default::default()
                }))
            }));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert_eq!(record.difficulty_level, "Hard");
    }

    #[tokio::test]
    async fn first_contributor_fills_difficulty_without_baseline() {
        let registry = FetcherRegistry::empty()
            .with(stub("first", false, || {
                Ok(Some(SourcePayload {
                    difficulty_level: Some("Medium".into()),
                    ..Default::default()
                }))
            }))
            .with(stub("second", false, || {
                Ok(Some(SourcePayload {
                    difficulty_level: Some("Hard".into()),
                    ..Default::default()
                }))
            }));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert_eq!(record.difficulty_level, "Medium");
    }

    #[tokio::test]
    async fn invalid_and_duplicate_urls_are_dropped() {
        let registry = FetcherRegistry::empty()
            .with(stub("a", false, || {
                Ok(Some(SourcePayload {
                    source_urls: vec!["https://example.com/a".into(), "not a url".into()],
                    ..Default::default()
                }))
            }))
            .with(stub("b", false, || {
                Ok(Some(SourcePayload {
                    source_urls: vec!["https://example.com/a".into(), "https://example.com/b".into()],
                    ..Default::default()
                }))
            }));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert_eq!(
            record.source_urls,
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn namespaced_payload_keeps_details() {
        let registry = FetcherRegistry::empty().with(stub("wiki", false, || {
            Ok(Some(SourcePayload {
                details: serde_json::json!({ "success_rate": "65%" }),
                ..Default::default()
            }))
        }));

        let record = aggregator(registry).aggregate("Acme", "SWE").await;
        assert_eq!(record.sources["wiki"]["details"]["success_rate"], "65%");
    }
}
