//! Application configuration for the interview prep engine.
//!
//! User config lives at `~/.interviewprep/interviewprep.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InterviewPrepError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "interviewprep.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".interviewprep";

// ---------------------------------------------------------------------------
// Config structs (matching interviewprep.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Query defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-call time budgets.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Additional HTTP JSON sources.
    #[serde(default)]
    pub sources: Vec<HttpSourceConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Role used when a query does not name one.
    #[serde(default = "default_role")]
    pub role: String,

    /// Experience level used when a query does not name one.
    #[serde(default = "default_experience_level")]
    pub experience_level: String,

    /// Preparation window used when a query does not name one.
    #[serde(default = "default_days_to_prepare")]
    pub days_to_prepare: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            experience_level: default_experience_level(),
            days_to_prepare: default_days_to_prepare(),
        }
    }
}

fn default_role() -> String {
    "Software Engineer".into()
}
fn default_experience_level() -> String {
    "Mid-level".into()
}
fn default_days_to_prepare() -> u32 {
    30
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for synthesis, questions, and study plans.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-flash-1.5".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_temperature() -> f32 {
    0.7
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the libSQL database file. `~` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.interviewprep/research.db".into()
}

impl StorageConfig {
    /// Resolve `database_path`, expanding a leading `~/`.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match self.database_path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    InterviewPrepError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.database_path)),
        }
    }
}

/// `[timeouts]` section. Every external call is bounded independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Budget for a single model completion.
    #[serde(default = "default_model_secs")]
    pub model_secs: u64,

    /// Budget for a single source fetcher.
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,

    /// Budget for a single store operation.
    #[serde(default = "default_store_secs")]
    pub store_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            model_secs: default_model_secs(),
            fetch_secs: default_fetch_secs(),
            store_secs: default_store_secs(),
        }
    }
}

fn default_model_secs() -> u64 {
    60
}
fn default_fetch_secs() -> u64 {
    30
}
fn default_store_secs() -> u64 {
    10
}

/// `[[sources]]` entry: an extra fetcher backed by an HTTP JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Namespaced key under which the payload is stored.
    pub name: String,
    /// URL with `{company}` and `{role}` placeholders.
    pub url_template: String,
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration: passed to the pipeline constructor.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Time budget for each model call.
    pub model_timeout: Duration,
    /// Time budget for each fetcher.
    pub fetch_timeout: Duration,
    /// Time budget for each store call.
    pub store_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            model_timeout: Duration::from_secs(config.timeouts.model_secs),
            fetch_timeout: Duration::from_secs(config.timeouts.fetch_secs),
            store_timeout: Duration::from_secs(config.timeouts.store_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.interviewprep/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| InterviewPrepError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.interviewprep/interviewprep.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| InterviewPrepError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        InterviewPrepError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| InterviewPrepError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| InterviewPrepError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| InterviewPrepError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the OpenRouter API key from the configured env var.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(InterviewPrepError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable \
             or pass --offline to use fallback content."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("database_path"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.days_to_prepare, 30);
        assert_eq!(parsed.defaults.role, "Software Engineer");
        assert_eq!(parsed.openrouter.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(parsed.timeouts.model_secs, 60);
    }

    #[test]
    fn config_with_sources() {
        let toml_str = r#"
[storage]
database_path = "/tmp/research.db"

[timeouts]
fetch_secs = 5

[[sources]]
name = "internal-wiki"
url_template = "https://wiki.example.com/api/interviews?company={company}&role={role}"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].name, "internal-wiki");
        assert_eq!(config.timeouts.fetch_secs, 5);
        assert_eq!(config.timeouts.store_secs, 10);
        assert_eq!(
            config.storage.resolved_path().unwrap(),
            PathBuf::from("/tmp/research.db")
        );
    }

    #[test]
    fn pipeline_config_from_app_config() {
        let app = AppConfig::default();
        let pipeline = PipelineConfig::from(&app);
        assert_eq!(pipeline.model_timeout, Duration::from_secs(60));
        assert_eq!(pipeline.fetch_timeout, Duration::from_secs(30));
        assert_eq!(pipeline.store_timeout, Duration::from_secs(10));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openrouter.api_key_env = "IP_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
