//! Configuration for CodeGraph.
//!
//! Values are resolved in three layers: the TOML file (or defaults), then
//! `CODEGRAPH_*` environment variables, then command-line flags applied by the
//! binary.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [store]
//! endpoint = "ws://localhost:8000"
//! use_in_memory = false
//! namespace = "codegraph"
//! database = "main"
//!
//! [service]
//! backend = "surrealdb"
//! ```

use crate::error::{CodeGraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default SurrealDB endpoint when none is configured
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000";
pub const DEFAULT_NAMESPACE: &str = "codegraph";
pub const DEFAULT_DATABASE: &str = "main";

// Environment variable names
pub const ENV_LOG_LEVEL: &str = "CODEGRAPH_LOG_LEVEL";
pub const ENV_DB_URL: &str = "CODEGRAPH_DB_URL";
pub const ENV_DB_IN_MEMORY: &str = "CODEGRAPH_DB_IN_MEMORY";
pub const ENV_DB_NAMESPACE: &str = "CODEGRAPH_DB_NAMESPACE";
pub const ENV_DB_DATABASE: &str = "CODEGRAPH_DB_DATABASE";
pub const ENV_DB_USERNAME: &str = "CODEGRAPH_DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "CODEGRAPH_DB_PASSWORD";
pub const ENV_BACKEND: &str = "CODEGRAPH_BACKEND";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Which `GraphQueryService` implementation to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceBackend {
    /// Store-backed service over SurrealDB
    #[default]
    SurrealDb,
    /// In-memory reference implementation
    Reference,
}

impl ServiceBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SurrealDb => "surrealdb",
            Self::Reference => "reference",
        }
    }
}

impl std::str::FromStr for ServiceBackend {
    type Err = CodeGraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "surrealdb" | "surreal" | "store" => Ok(Self::SurrealDb),
            "reference" | "memory" | "mock" => Ok(Self::Reference),
            _ => Err(CodeGraphError::Config(format!(
                "Invalid backend '{}'. Must be one of: surrealdb, reference",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ServiceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CodeGraphConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Graph store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Server endpoint, ignored when `use_in_memory` is set
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Use the embedded in-memory engine
    #[serde(default)]
    pub use_in_memory: bool,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Per-query deadline; unset means no deadline
    #[serde(default)]
    pub query_timeout_secs: Option<u64>,
}

/// Service selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub backend: ServiceBackend,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            use_in_memory: false,
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
            query_timeout_secs: None,
        }
    }
}

impl StoreConfig {
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_secs.map(Duration::from_secs)
    }
}

impl CodeGraphConfig {
    /// Configuration for the embedded in-memory store
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.store.use_in_memory = true;
        config
    }

    /// Load configuration from a TOML file, apply environment overrides and validate
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the result is invalid
    pub async fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CodeGraphError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_toml(&content)?;
        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CodeGraphError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CodeGraphError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(CodeGraphError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if !self.store.use_in_memory && self.store.endpoint.trim().is_empty() {
            return Err(CodeGraphError::Config(
                "Store endpoint must be set unless use_in_memory is enabled".to_string(),
            ));
        }

        if self.store.namespace.is_empty() || self.store.database.is_empty() {
            return Err(CodeGraphError::Config(
                "Store namespace and database cannot be empty".to_string(),
            ));
        }

        if self.store.username.is_some() != self.store.password.is_some() {
            return Err(CodeGraphError::Config(
                "Store username and password must be set together".to_string(),
            ));
        }

        if self.store.query_timeout_secs == Some(0) {
            return Err(CodeGraphError::Config(
                "query_timeout_secs must be greater than 0".to_string(),
            ));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Merge environment variable overrides into the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    pub fn merge_env_vars(&mut self) -> Result<()> {
        debug!("Merging environment variable overrides");

        if let Ok(log_level) = std::env::var(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Ok(db_url) = std::env::var(ENV_DB_URL) {
            debug!("Overriding store endpoint from environment");
            self.store.endpoint = db_url;
        }

        if let Ok(in_memory) = std::env::var(ENV_DB_IN_MEMORY) {
            self.store.use_in_memory = parse_bool(&in_memory).ok_or_else(|| {
                CodeGraphError::Config(format!(
                    "Invalid {} value '{}': expected true or false",
                    ENV_DB_IN_MEMORY, in_memory
                ))
            })?;
            debug!("Overriding use_in_memory from environment: {}", self.store.use_in_memory);
        }

        if let Ok(namespace) = std::env::var(ENV_DB_NAMESPACE) {
            debug!("Overriding store namespace from environment: {}", namespace);
            self.store.namespace = namespace;
        }

        if let Ok(database) = std::env::var(ENV_DB_DATABASE) {
            debug!("Overriding store database from environment: {}", database);
            self.store.database = database;
        }

        if let Ok(username) = std::env::var(ENV_DB_USERNAME) {
            debug!("Overriding store username from environment");
            self.store.username = Some(username);
        }

        if let Ok(password) = std::env::var(ENV_DB_PASSWORD) {
            debug!("Overriding store password from environment");
            self.store.password = Some(password);
        }

        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            self.service.backend = backend.parse()?;
            debug!("Overriding service backend from environment: {}", self.service.backend);
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = CodeGraphConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.store.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.store.use_in_memory);
        assert_eq!(config.service.backend, ServiceBackend::SurrealDb);
        assert!(config.store.query_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CodeGraphConfig::default();

        config.general.log_level = "loud".to_string();
        assert!(config.validate().is_err());
        config.general.log_level = "debug".to_string();

        config.store.endpoint = String::new();
        assert!(config.validate().is_err());
        config.store.use_in_memory = true;
        assert!(config.validate().is_ok());

        config.store.username = Some("root".to_string());
        assert!(config.validate().is_err());
        config.store.password = Some("root".to_string());
        assert!(config.validate().is_ok());

        config.store.query_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = CodeGraphConfig::from_toml(
            r#"
            [store]
            use_in_memory = true
            query_timeout_secs = 5

            [service]
            backend = "reference"
            "#,
        )
        .unwrap();

        assert!(config.store.use_in_memory);
        assert_eq!(config.store.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.store.query_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.service.backend, ServiceBackend::Reference);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = CodeGraphConfig::in_memory();
        config.store.namespace = "ns".to_string();
        let text = config.to_toml().unwrap();
        assert_eq!(CodeGraphConfig::from_toml(&text).unwrap(), config);
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("codegraph.toml");
        std::fs::write(
            &path,
            "[store]\nendpoint = \"ws://db.internal:8000\"\ndatabase = \"graphs\"\n",
        )
        .unwrap();

        let config = CodeGraphConfig::load_from_path(&path).await.unwrap();
        assert_eq!(config.store.database, "graphs");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = CodeGraphConfig::load_from_path(&temp_dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CodeGraphError::Config(_)));
    }

    #[test]
    fn test_env_var_overrides() {
        let mut config = CodeGraphConfig::default();

        unsafe {
            env::set_var(ENV_DB_NAMESPACE, "env_ns");
            env::set_var(ENV_DB_IN_MEMORY, "yes");
        }

        let result = config.merge_env_vars();

        unsafe {
            env::remove_var(ENV_DB_NAMESPACE);
            env::remove_var(ENV_DB_IN_MEMORY);
        }

        result.unwrap();
        assert_eq!(config.store.namespace, "env_ns");
        assert!(config.store.use_in_memory);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("SurrealDB".parse::<ServiceBackend>().unwrap(), ServiceBackend::SurrealDb);
        assert_eq!("mock".parse::<ServiceBackend>().unwrap(), ServiceBackend::Reference);
        assert!("neo4j".parse::<ServiceBackend>().is_err());
        assert_eq!(ServiceBackend::Reference.to_string(), "reference");
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
