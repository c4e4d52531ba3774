//! Error types for the CodeGraph system.

/// Result type alias for CodeGraph operations.
pub type Result<T> = std::result::Result<T, CodeGraphError>;

/// Main error type for the CodeGraph system.
#[derive(Debug, thiserror::Error)]
pub enum CodeGraphError {
    /// The graph store is unreachable or rejected the verification query
    #[error("Connection error: {0}")]
    Connection(String),

    /// A query or mutation failed after the connection was established
    #[error("Store error: {0}")]
    Store(String),

    /// Another File node already owns this path
    #[error("File path {path} is already owned by node {existing_id}")]
    PathConflict { path: String, existing_id: String },

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CodeGraphError {
    /// Create a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a new store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a new path conflict error
    pub fn path_conflict(path: impl Into<String>, existing_id: impl Into<String>) -> Self {
        Self::PathConflict {
            path: path.into(),
            existing_id: existing_id.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a store error
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if this is a path conflict
    pub fn is_path_conflict(&self) -> bool {
        matches!(self, Self::PathConflict { .. })
    }

    /// Check if this is an invalid input error
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodeGraphError::connection("refused");
        assert_eq!(err.to_string(), "Connection error: refused");
        assert!(err.is_connection());

        let err = CodeGraphError::path_conflict("/a.py", "F1");
        assert_eq!(err.to_string(), "File path /a.py is already owned by node F1");
        assert!(err.is_path_conflict());
        assert!(!err.is_store());
    }

    #[test]
    fn test_from_serde_error() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CodeGraphError = parse_err.into();
        assert!(matches!(err, CodeGraphError::Serialization(_)));
    }
}
