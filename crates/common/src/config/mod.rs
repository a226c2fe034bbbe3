//! Configuration management for Compras services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - `CLAUDE_API_KEY` for the answer service credential
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the answer service credential
pub const CREDENTIAL_ENV_VAR: &str = "CLAUDE_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Spreadsheet (row store) configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Answer service configuration
    #[serde(default)]
    pub answer: AnswerConfig,

    /// Row search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path to the CSV export of the procurement spreadsheet
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerConfig {
    /// API key; absence only fails the requests that need it
    pub api_key: Option<String>,

    /// Messages API endpoint
    #[serde(default = "default_answer_endpoint")]
    pub endpoint: String,

    /// Model to use
    #[serde(default = "default_answer_model")]
    pub model: String,

    /// Maximum output tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Value of the `anthropic-version` header
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_answer_timeout")]
    pub timeout_secs: u64,
}

/// Which row selection strategy builds the model context
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Per-term description matching with availability/history filters
    #[default]
    Classified,
    /// Fixed keyword list matched across every column, first rows as fallback
    Keyword,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: SearchMode,

    /// Row cap for keyword mode
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Description budget (characters) for availability items
    #[serde(default = "default_availability_chars")]
    pub availability_description_chars: usize,

    /// Description budget (characters) for history items
    #[serde(default = "default_history_chars")]
    pub history_description_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info,compras_common=debug")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Expose Prometheus metrics at /metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_csv_path() -> PathBuf { PathBuf::from("data/planilha.csv") }
fn default_delimiter() -> char { ',' }
fn default_answer_endpoint() -> String { "https://api.anthropic.com/v1/messages".to_string() }
fn default_answer_model() -> String { "claude-sonnet-4-20250514".to_string() }
fn default_max_tokens() -> u32 { 1024 }
fn default_anthropic_version() -> String { "2023-06-01".to_string() }
fn default_answer_timeout() -> u64 { 60 }
fn default_max_rows() -> usize { 50 }
fn default_availability_chars() -> usize { 100 }
fn default_history_chars() -> usize { 80 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_enabled() -> bool { true }
fn default_service_name() -> String { "compras".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_answer_endpoint(),
            model: default_answer_model(),
            max_tokens: default_max_tokens(),
            anthropic_version: default_anthropic_version(),
            timeout_secs: default_answer_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            max_rows: default_max_rows(),
            availability_description_chars: default_availability_chars(),
            history_description_chars: default_history_chars(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_metrics_enabled(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            // Plain credential variable used by existing deployments
            .set_override_option("answer.api_key", std::env::var(CREDENTIAL_ENV_VAR).ok())?

            .build()?;

        config.try_deserialize()
    }

    /// Address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl AnswerConfig {
    /// The credential, treating an empty value as absent
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.answer.model, "claude-sonnet-4-20250514");
        assert_eq!(config.answer.max_tokens, 1024);
        assert_eq!(config.search.mode, SearchMode::Classified);
        assert_eq!(config.search.max_rows, 50);
        assert_eq!(config.store.csv_path, PathBuf::from("data/planilha.csv"));
        assert_eq!(config.answer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let mut answer = AnswerConfig::default();
        assert!(answer.credential().is_none());

        answer.api_key = Some("   ".to_string());
        assert!(answer.credential().is_none());

        answer.api_key = Some("sk-test".to_string());
        assert_eq!(answer.credential(), Some("sk-test"));
    }

    #[test]
    fn test_search_mode_deserializes_lowercase() {
        let search: SearchConfig = serde_json::from_str(r#"{"mode": "keyword"}"#).unwrap();
        assert_eq!(search.mode, SearchMode::Keyword);
        assert_eq!(search.availability_description_chars, 100);
        assert_eq!(search.history_description_chars, 80);
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }
}
