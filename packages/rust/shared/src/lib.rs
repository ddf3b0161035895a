//! Shared types, error model, and configuration for the interview prep engine.
//!
//! This crate is the foundation depended on by all other crates in the workspace.
//! It provides:
//! - [`InterviewPrepError`]: the unified error type
//! - Domain types ([`ResearchQuery`], [`SourceRecord`], [`SynthesizedGuide`],
//!   [`StudyPlan`], [`ResearchReport`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HttpSourceConfig, OpenRouterConfig, PipelineConfig, StorageConfig,
    TimeoutsConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{InterviewPrepError, Result};
pub use types::{
    CacheKey, CustomQuestionSet, MAX_CUSTOM_QUESTIONS, ReportId, ResearchQuery, ResearchReport,
    SourcePayload, SourceRecord, StudyPlan, SynthesizedGuide,
};
