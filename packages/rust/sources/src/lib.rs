//! Data-source fetchers and the multi-source aggregator.
//!
//! This crate provides:
//! - [`fetchers`]: the [`SourceFetcher`] trait and built-in sources
//!   (Glassdoor template, LeetCode, GeeksforGeeks, InterviewBit, HTTP JSON)
//! - [`FetcherRegistry`]: holds fetchers in priority order
//! - [`aggregator`]: runs every fetcher independently and merges the results

pub mod aggregator;
pub mod fetchers;

pub use aggregator::SourceAggregator;
pub use fetchers::{
    FetcherRegistry, GeeksforGeeksFetcher, GlassdoorTemplate, HttpSourceFetcher,
    InterviewBitFetcher, LeetCodeFetcher, SourceFetcher,
};
