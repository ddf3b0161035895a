//! End-to-end `research` pipeline: cache lookup → aggregate → synthesize → persist.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use interviewprep_llm::ModelClient;
use interviewprep_shared::{
    InterviewPrepError, PipelineConfig, ReportId, ResearchQuery, ResearchReport, Result,
};
use interviewprep_sources::{FetcherRegistry, SourceAggregator};
use interviewprep_storage::ResearchStore;

use crate::persistence::PersistenceQueue;
use crate::synthesis::Synthesizer;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once source data is available, with the contributing source count.
    fn sources_ready(&self, count: usize, cached: bool);
    /// Called when the report is assembled.
    fn done(&self, report: &ResearchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn sources_ready(&self, _count: usize, _cached: bool) {}
    fn done(&self, _report: &ResearchReport) {}
}

/// Coordinates one research request at a time against shared collaborators.
///
/// Only a failed store read (or an invalid query) is returned as an error;
/// source and model failures degrade to fallback content, and writes go
/// through the background [`PersistenceQueue`].
pub struct ResearchPipeline {
    store: Arc<dyn ResearchStore>,
    aggregator: SourceAggregator,
    synthesizer: Synthesizer,
    persistence: PersistenceQueue,
    config: PipelineConfig,
}

impl ResearchPipeline {
    /// Build the pipeline and spawn its persistence worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        store: Arc<dyn ResearchStore>,
        registry: FetcherRegistry,
        model: Arc<dyn ModelClient>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            aggregator: SourceAggregator::new(registry, config.fetch_timeout),
            synthesizer: Synthesizer::new(model, config.model_timeout),
            persistence: PersistenceQueue::spawn(store.clone(), config.store_timeout),
            store,
            config,
        }
    }

    /// Queue used for deferred writes.
    pub fn persistence(&self) -> &PersistenceQueue {
        &self.persistence
    }

    /// Run with no progress reporting.
    pub async fn research(&self, query: &ResearchQuery) -> Result<ResearchReport> {
        self.run(query, &SilentProgress).await
    }

    /// Produce a report for `query`.
    #[instrument(skip_all, fields(company = %query.company_name, role = %query.role))]
    pub async fn run(
        &self,
        query: &ResearchQuery,
        progress: &dyn ProgressReporter,
    ) -> Result<ResearchReport> {
        query.validate()?;
        let start = Instant::now();
        let key = query.key();

        // --- Phase 1: Cache lookup ---
        progress.phase("Checking cache");
        let cached = tokio::time::timeout(self.config.store_timeout, self.store.get(&key))
            .await
            .map_err(|_| {
                InterviewPrepError::Connectivity(format!(
                    "store read timed out after {}s",
                    self.config.store_timeout.as_secs()
                ))
            })??;

        // --- Phase 2: Sources ---
        let (record, cache_hit) = match cached {
            Some(record) => {
                info!(%key, "cache hit, reusing stored source data");
                (record, true)
            }
            None => {
                progress.phase("Gathering interview data");
                let record = self
                    .aggregator
                    .aggregate(query.company_name.trim(), query.role.trim())
                    .await;
                self.persistence.save_sources(record.clone());
                (record, false)
            }
        };
        progress.sources_ready(record.sources.len(), cache_hit);

        // --- Phase 3: Synthesis ---
        progress.phase("Generating preparation guide");
        let (ai_synthesis, custom_questions, study_plan) =
            self.synthesizer.run_all(query, &record).await;

        // --- Phase 4: Assemble + persist ---
        let report = ResearchReport {
            id: ReportId::new(),
            query: query.clone(),
            interview_data: record,
            ai_synthesis,
            custom_questions,
            study_plan,
            cache_hit,
            generated_at: Utc::now(),
        };
        self.persistence.append_report(report.clone());

        info!(
            report_id = %report.id,
            cache_hit,
            sources = report.interview_data.sources.len(),
            questions = report.custom_questions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "research complete"
        );
        progress.done(&report);

        Ok(report)
    }

    /// Distinct companies with stored source data.
    pub async fn list_companies(&self) -> Result<Vec<String>> {
        tokio::time::timeout(self.config.store_timeout, self.store.distinct_companies())
            .await
            .map_err(|_| {
                InterviewPrepError::Connectivity(format!(
                    "store read timed out after {}s",
                    self.config.store_timeout.as_secs()
                ))
            })?
    }

    /// Wait for queued writes, then stop the persistence worker.
    pub async fn shutdown(self) {
        self.persistence.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use interviewprep_llm::DisabledModel;
    use interviewprep_shared::{CacheKey, SourcePayload, SourceRecord};
    use interviewprep_sources::SourceFetcher;
    use interviewprep_storage::Storage;

    use super::*;

    /// In-memory store; optionally fails writes.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<CacheKey, SourceRecord>>,
        reports: Mutex<Vec<ResearchReport>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl ResearchStore for MemoryStore {
        async fn connect(&self) -> Result<()> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }

        async fn get(&self, key: &CacheKey) -> Result<Option<SourceRecord>> {
            Ok(self.records.lock().unwrap().get(key).cloned())
        }

        async fn upsert(&self, record: &SourceRecord) -> Result<()> {
            if self.fail_writes {
                return Err(InterviewPrepError::Storage("read-only".into()));
            }
            self.records.lock().unwrap().insert(record.key(), record.clone());
            Ok(())
        }

        async fn append_report(&self, report: &ResearchReport) -> Result<()> {
            if self.fail_writes {
                return Err(InterviewPrepError::Storage("read-only".into()));
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }

        async fn distinct_companies(&self) -> Result<Vec<String>> {
            let mut names: Vec<String> = self
                .records
                .lock()
                .unwrap()
                .values()
                .map(|r| r.company_name.clone())
                .collect();
            names.sort();
            names.dedup();
            Ok(names)
        }
    }

    /// Counts invocations.
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceFetcher for CountingFetcher {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, _company: &str, _role: &str) -> Result<Option<SourcePayload>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(SourcePayload {
                tips: vec!["Sleep well".into()],
                ..Default::default()
            }))
        }
    }

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("ip_pipeline_{}.db", uuid::Uuid::now_v7()))
    }

    fn offline_pipeline(store: Arc<dyn ResearchStore>, registry: FetcherRegistry) -> ResearchPipeline {
        ResearchPipeline::new(store, registry, Arc::new(DisabledModel), PipelineConfig::default())
    }

    #[tokio::test]
    async fn google_cold_cache_with_failing_model() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = offline_pipeline(store.clone(), FetcherRegistry::new());

        let query = ResearchQuery::new("Google")
            .with_role("Software Engineer")
            .with_experience_level("Mid-level")
            .with_days_to_prepare(30);
        let report = pipeline.research(&query).await.unwrap();

        assert!(!report.cache_hit);
        assert_eq!(report.interview_data.difficulty_level, "Very Hard");
        assert!(!report.custom_questions.is_empty());
        assert!(report.custom_questions.len() <= 10);
        assert!(report.ai_synthesis.overview.contains("Google"));
        assert_eq!(report.study_plan.duration, 30);

        pipeline.persistence().flush().await;
        assert_eq!(store.records.lock().unwrap().len(), 1);
        assert_eq!(store.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_fetchers() {
        let store = Arc::new(MemoryStore::default());
        let mut seeded = SourceRecord::new("Google", "Software Engineer");
        seeded.difficulty_level = "Stored".into();
        store.upsert(&seeded).await.unwrap();

        let fetcher = Arc::new(CountingFetcher::default());
        let pipeline = offline_pipeline(store.clone(), FetcherRegistry::empty().with(fetcher.clone()));

        let report = pipeline
            .research(&ResearchQuery::new("google").with_role("software engineer"))
            .await
            .unwrap();

        assert!(report.cache_hit);
        assert_eq!(report.interview_data.difficulty_level, "Stored");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn two_runs_two_reports_one_record() {
        let storage = Arc::new(Storage::open(&temp_db_path()).await.unwrap());
        let fetcher = Arc::new(CountingFetcher::default());
        let pipeline = offline_pipeline(
            storage.clone(),
            FetcherRegistry::new().with(fetcher.clone()),
        );
        let query = ResearchQuery::new("Amazon");

        let first = pipeline.research(&query).await.unwrap();
        pipeline.persistence().flush().await;
        let second = pipeline.research(&query).await.unwrap();
        pipeline.persistence().flush().await;

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_ne!(first.id, second.id);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.source_records, 1);
        assert_eq!(stats.reports, 2);
        assert_eq!(pipeline.list_companies().await.unwrap(), vec!["Amazon"]);

        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn store_read_failure_is_fatal() {
        let storage = Arc::new(Storage::new(temp_db_path()));
        let pipeline = offline_pipeline(storage, FetcherRegistry::new());

        let err = pipeline.research(&ResearchQuery::new("Google")).await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn write_failures_do_not_fail_the_request() {
        let store = Arc::new(MemoryStore {
            fail_writes: true,
            ..Default::default()
        });
        let pipeline = offline_pipeline(store.clone(), FetcherRegistry::new());

        let report = pipeline.research(&ResearchQuery::new("Microsoft")).await.unwrap();
        pipeline.persistence().flush().await;

        assert_eq!(report.interview_data.difficulty_level, "Hard");
        assert!(store.records.lock().unwrap().is_empty());
        assert!(store.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_company_is_rejected() {
        let fetcher = Arc::new(CountingFetcher::default());
        let pipeline = offline_pipeline(
            Arc::new(MemoryStore::default()),
            FetcherRegistry::empty().with(fetcher.clone()),
        );

        let err = pipeline.research(&ResearchQuery::new("  ")).await.unwrap_err();
        assert!(matches!(err, InterviewPrepError::Validation { .. }));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_store_read_is_connectivity_error() {
        struct SlowStore;

        #[async_trait]
        impl ResearchStore for SlowStore {
            async fn connect(&self) -> Result<()> {
                Ok(())
            }
            async fn disconnect(&self) -> Result<()> {
                Ok(())
            }
            async fn get(&self, _key: &CacheKey) -> Result<Option<SourceRecord>> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }
            async fn upsert(&self, _record: &SourceRecord) -> Result<()> {
                Ok(())
            }
            async fn append_report(&self, _report: &ResearchReport) -> Result<()> {
                Ok(())
            }
            async fn distinct_companies(&self) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
        }

        let config = PipelineConfig {
            store_timeout: Duration::from_millis(20),
            ..PipelineConfig::default()
        };
        let pipeline = ResearchPipeline::new(
            Arc::new(SlowStore),
            FetcherRegistry::new(),
            Arc::new(DisabledModel),
            config,
        );

        let err = pipeline.research(&ResearchQuery::new("Google")).await.unwrap_err();
        assert!(err.is_connectivity());
    }
}
