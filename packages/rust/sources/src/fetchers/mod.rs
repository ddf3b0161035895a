//! Source fetcher trait and built-in fetchers.
//!
//! Each fetcher is an independent failure domain: it returns a structured
//! [`SourcePayload`] for one external data source, or nothing.

mod geeksforgeeks;
mod glassdoor;
mod http;
mod interviewbit;
mod leetcode;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use interviewprep_shared::{HttpSourceConfig, InterviewPrepError, Result, SourcePayload};

pub use geeksforgeeks::GeeksforGeeksFetcher;
pub use glassdoor::GlassdoorTemplate;
pub use http::HttpSourceFetcher;
pub use interviewbit::InterviewBitFetcher;
pub use leetcode::LeetCodeFetcher;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A pluggable data source for one company/role.
///
/// Fetchers are tried in registration order; the baseline fetcher seeds the
/// scalar fields that the others only augment.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Namespaced key under which this source's payload is stored.
    fn name(&self) -> &str;

    /// Whether this fetcher seeds baseline scalar fields (`difficulty_level`).
    fn is_baseline(&self) -> bool {
        false
    }

    /// Fetch data for `company`/`role`. `Ok(None)` means the source has nothing.
    async fn fetch(&self, company: &str, role: &str) -> Result<Option<SourcePayload>>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered fetchers in priority order.
#[derive(Clone)]
pub struct FetcherRegistry {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
}

impl FetcherRegistry {
    /// Create a registry with all built-in fetchers (baseline template first).
    pub fn new() -> Self {
        Self {
            fetchers: vec![
                Arc::new(GlassdoorTemplate),
                Arc::new(LeetCodeFetcher),
                Arc::new(GeeksforGeeksFetcher),
                Arc::new(InterviewBitFetcher),
            ],
        }
    }

    /// Create a registry with no fetchers.
    pub fn empty() -> Self {
        Self {
            fetchers: Vec::new(),
        }
    }

    /// Append a fetcher after those already registered.
    pub fn register(&mut self, fetcher: Arc<dyn SourceFetcher>) {
        self.fetchers.push(fetcher);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.register(fetcher);
        self
    }

    /// Register one [`HttpSourceFetcher`] per configured `[[sources]]` entry.
    ///
    /// Names key the per-source payloads, so a name already registered is a
    /// config error.
    pub fn with_http_sources(mut self, sources: &[HttpSourceConfig], timeout: Duration) -> Result<Self> {
        for source in sources {
            if self.names().contains(&source.name.as_str()) {
                return Err(InterviewPrepError::config(format!(
                    "duplicate source name `{}`",
                    source.name
                )));
            }
            self.register(Arc::new(HttpSourceFetcher::new(source, timeout)?));
        }
        Ok(self)
    }

    /// Fetchers in registration order.
    pub fn fetchers(&self) -> &[Arc<dyn SourceFetcher>] {
        &self.fetchers
    }

    /// Registered fetcher names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.fetchers.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}

impl Default for FetcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, hyphen-separated slug used in source URLs.
pub(crate) fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
