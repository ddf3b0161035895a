//! Research orchestration for InterviewPrep.
//!
//! Ties the store, source aggregation and model-backed synthesis together
//! into the `research` workflow, and owns the model-output normalizer.

pub mod normalizer;
pub mod persistence;
pub mod pipeline;
pub mod prompts;
pub mod synthesis;

pub use normalizer::{GuideParser, JsonGuideParser, Normalizer, SectionGuideParser, normalize};
pub use persistence::PersistenceQueue;
pub use pipeline::{ProgressReporter, ResearchPipeline, SilentProgress};
pub use synthesis::{ModelOutcome, Synthesizer};
