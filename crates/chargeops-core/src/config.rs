//! Configuration management for the `ChargeOps` console

use crate::types::EntityKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Backend service locations
    #[serde(default)]
    pub services: ServicesConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Background polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// List view configuration
    #[serde(default)]
    pub view: ViewConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Base URLs of the backend services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Users and authentication service
    #[serde(default = "default_users_url")]
    pub users: String,

    /// Charging-points service
    #[serde(default = "default_chargers_url")]
    pub chargers: String,

    /// Feedback service
    #[serde(default = "default_feedback_url")]
    pub feedback: String,

    /// Charger command service
    #[serde(default = "default_command_url")]
    pub command: String,

    /// Transaction history service; falls back to the users service
    #[serde(default)]
    pub transactions: Option<String>,
}

impl ServicesConfig {
    /// Base URL of the service owning an entity kind
    #[must_use]
    pub fn base_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Charger => &self.chargers,
            EntityKind::Feedback => &self.feedback,
            EntityKind::Transaction => self.transactions.as_deref().unwrap_or(&self.users),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl HttpConfig {
    /// Request timeout as a duration
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Connect timeout as a duration
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File holding the bearer token between invocations
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

/// Background polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Charger list refresh interval in seconds
    #[serde(default = "default_charger_interval")]
    pub charger_interval: u64,
}

impl PollingConfig {
    /// Charger refresh interval as a duration
    #[must_use]
    pub const fn charger_interval(&self) -> Duration {
        Duration::from_secs(self.charger_interval)
    }
}

/// List view configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Page size for users, chargers and feedback
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Page size for transactions
    #[serde(default = "default_transaction_page_size")]
    pub transaction_page_size: usize,
}

impl ViewConfig {
    /// Page size used for an entity kind
    #[must_use]
    pub const fn page_size_for(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Transaction => self.transaction_page_size,
            _ => self.page_size,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_users_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_chargers_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_feedback_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_command_url() -> String {
    "http://localhost:9000".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("chargeops/{}", env!("CARGO_PKG_VERSION"))
}

fn default_token_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "chargeops").map_or_else(
        || PathBuf::from(".chargeops-token"),
        |dirs| dirs.config_dir().join("token"),
    )
}

const fn default_charger_interval() -> u64 {
    5
}

const fn default_page_size() -> usize {
    8
}

const fn default_transaction_page_size() -> usize {
    10
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            users: default_users_url(),
            chargers: default_chargers_url(),
            feedback: default_feedback_url(),
            command: default_command_url(),
            transactions: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            charger_interval: default_charger_interval(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            transaction_page_size: default_transaction_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from `chargeops.toml` (optional) and `CHARGEOPS__*`
    /// environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::build(config::File::with_name("chargeops").required(false))
    }

    /// Load configuration from an explicit file, still layering the
    /// environment on top
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the result is invalid.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("CHARGEOPS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(
            users = %config.services.users,
            chargers = %config.services.chargers,
            feedback = %config.services.feedback,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending key.
    pub fn validate(&self) -> crate::Result<()> {
        let urls = [
            ("services.users", Some(self.services.users.as_str())),
            ("services.chargers", Some(self.services.chargers.as_str())),
            ("services.feedback", Some(self.services.feedback.as_str())),
            ("services.command", Some(self.services.command.as_str())),
            ("services.transactions", self.services.transactions.as_deref()),
        ];
        for (key, url) in urls {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(crate::Error::configuration(format!(
                    "{key} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.view.page_size == 0 || self.view.transaction_page_size == 0 {
            return Err(crate::Error::configuration("view page sizes must be at least 1"));
        }

        if self.polling.charger_interval == 0 {
            return Err(crate::Error::configuration(
                "polling.charger_interval must be at least 1 second",
            ));
        }

        if self.http.request_timeout == 0 {
            return Err(crate::Error::configuration(
                "http.request_timeout must be at least 1 second",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.services.users, "http://localhost:8080");
        assert_eq!(config.services.chargers, "http://localhost:8081");
        assert_eq!(config.services.feedback, "http://localhost:8082");
        assert_eq!(config.services.command, "http://localhost:9000");
        assert!(config.services.transactions.is_none());

        assert_eq!(config.http.request_timeout(), Duration::from_secs(30));
        assert!(config.http.user_agent.starts_with("chargeops/"));
        assert_eq!(config.polling.charger_interval(), Duration::from_secs(5));
        assert_eq!(config.view.page_size, 8);
        assert_eq!(config.view.transaction_page_size, 10);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_for_entity_kind() {
        let mut services = ServicesConfig::default();
        assert_eq!(services.base_for(EntityKind::Charger), "http://localhost:8081");
        assert_eq!(services.base_for(EntityKind::Transaction), "http://localhost:8080");

        services.transactions = Some("http://billing:7000".to_string());
        assert_eq!(services.base_for(EntityKind::Transaction), "http://billing:7000");
    }

    #[test]
    fn test_page_size_for_entity_kind() {
        let view = ViewConfig::default();
        assert_eq!(view.page_size_for(EntityKind::Feedback), 8);
        assert_eq!(view.page_size_for(EntityKind::Transaction), 10);
    }

    #[test]
    fn test_partial_config_deserialization() {
        let json_str = r#"{
            "services": {"chargers": "http://cps.internal:8081"},
            "view": {"page_size": 20}
        }"#;

        let config: Config = serde_json::from_str(json_str).unwrap();

        assert_eq!(config.services.chargers, "http://cps.internal:8081");
        assert_eq!(config.services.users, "http://localhost:8080");
        assert_eq!(config.view.page_size, 20);
        assert_eq!(config.view.transaction_page_size, 10);
        assert_eq!(config.polling.charger_interval, 5);
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[services]\nfeedback = \"https://feedback.example.com\"\n\n[polling]\ncharger_interval = 15"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();

        assert_eq!(config.services.feedback, "https://feedback.example.com");
        assert_eq!(config.polling.charger_interval, 15);
        assert_eq!(config.view.page_size, 8);
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(crate::Error::Configuration { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config::default();
        config.services.command = "localhost:9000".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("services.command"));
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        config.view.transaction_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.polling.charger_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.services.transactions = Some("http://localhost:8083".to_string());

        let serialized = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, config);
    }
}
