//! Connection configuration for the graph store.

use codegraph_core::config::{StoreConfig, DEFAULT_DATABASE, DEFAULT_ENDPOINT, DEFAULT_NAMESPACE};
use codegraph_core::error::{CodeGraphError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection mode for SurrealDB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Embedded in-memory engine
    Memory,
    /// Remote server
    Remote { endpoint: String },
}

/// Configuration for a graph store connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    pub mode: ConnectionMode,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub query_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Create an in-memory configuration
    pub fn memory() -> Self {
        Self::with_mode(ConnectionMode::Memory)
    }

    /// Create a remote configuration
    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self::with_mode(ConnectionMode::Remote {
            endpoint: endpoint.into(),
        })
    }

    /// Pick the mode from an endpoint and the in-memory flag.
    ///
    /// The endpoint is ignored when `use_in_memory` is set; an empty endpoint
    /// falls back to the local default server.
    pub fn from_endpoint(endpoint: Option<&str>, use_in_memory: bool) -> Self {
        if use_in_memory {
            return Self::memory();
        }
        match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => Self::remote(endpoint),
            None => Self::remote(DEFAULT_ENDPOINT),
        }
    }

    fn with_mode(mode: ConnectionMode) -> Self {
        Self {
            mode,
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            query_timeout: None,
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set authentication credentials
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set a per-query deadline
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn is_memory(&self) -> bool {
        matches!(self.mode, ConnectionMode::Memory)
    }

    /// Get the connection string for SurrealDB
    pub fn connection_string(&self) -> String {
        match &self.mode {
            ConnectionMode::Memory => "mem://".to_string(),
            ConnectionMode::Remote { endpoint } => endpoint.clone(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(CodeGraphError::config("Namespace cannot be empty"));
        }
        if self.database.is_empty() {
            return Err(CodeGraphError::config("Database name cannot be empty"));
        }
        if let ConnectionMode::Remote { endpoint } = &self.mode {
            if endpoint.trim().is_empty() {
                return Err(CodeGraphError::config("Endpoint cannot be empty"));
            }
        }
        if self.query_timeout == Some(Duration::ZERO) {
            return Err(CodeGraphError::config("Query timeout must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::remote(DEFAULT_ENDPOINT)
    }
}

impl From<&StoreConfig> for ConnectionConfig {
    fn from(store: &StoreConfig) -> Self {
        let mut config = Self::from_endpoint(Some(&store.endpoint), store.use_in_memory)
            .with_namespace(store.namespace.clone())
            .with_database(store.database.clone());
        if let (Some(username), Some(password)) = (&store.username, &store.password) {
            config = config.with_auth(username.clone(), password.clone());
        }
        config.query_timeout = store.query_timeout();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_config() {
        let config = ConnectionConfig::memory();
        assert!(config.is_memory());
        assert_eq!(config.namespace, "codegraph");
        assert_eq!(config.database, "main");
        assert_eq!(config.connection_string(), "mem://");
    }

    #[test]
    fn test_from_endpoint() {
        let config = ConnectionConfig::from_endpoint(Some("ws://db:8000"), false);
        assert_eq!(config.connection_string(), "ws://db:8000");

        let config = ConnectionConfig::from_endpoint(Some("ws://db:8000"), true);
        assert!(config.is_memory());

        let config = ConnectionConfig::from_endpoint(None, false);
        assert_eq!(config.connection_string(), DEFAULT_ENDPOINT);

        let config = ConnectionConfig::from_endpoint(Some("  "), false);
        assert_eq!(config.connection_string(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_from_store_config() {
        let store = StoreConfig {
            use_in_memory: true,
            namespace: "ns".to_string(),
            username: Some("root".to_string()),
            password: Some("secret".to_string()),
            query_timeout_secs: Some(3),
            ..StoreConfig::default()
        };
        let config = ConnectionConfig::from(&store);
        assert!(config.is_memory());
        assert_eq!(config.namespace, "ns");
        assert_eq!(config.username.as_deref(), Some("root"));
        assert_eq!(config.query_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_validation() {
        assert!(ConnectionConfig::memory().validate().is_ok());

        let mut config = ConnectionConfig::memory();
        config.namespace = String::new();
        assert!(config.validate().is_err());

        assert!(ConnectionConfig::remote("").validate().is_err());
        assert!(ConnectionConfig::memory()
            .with_query_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
