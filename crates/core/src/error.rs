//! Error types for Catalyst
//!
//! This module provides unified error handling across the generator,
//! covering catalog introspection, schema validation, code generation,
//! artifact IO and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Catalyst
#[derive(Debug, Error)]
pub enum EngineError {
    // ========================================================================
    // Introspection Errors
    // ========================================================================
    /// A catalog query failed
    #[error("Introspection query '{query}' failed: {message}")]
    Introspection { query: String, message: String },

    /// Could not connect to the database
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// A constraint definition could not be parsed
    #[error("Unrecognized constraint definition on '{table}': {definition}")]
    ConstraintParse { table: String, definition: String },

    // ========================================================================
    // Schema Errors
    // ========================================================================
    /// General schema validation error
    #[error("Schema validation error: {0}")]
    Validation(String),

    /// Table not found in the schema graph
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in a table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Duplicate table name
    #[error("Duplicate table name: '{0}' already exists")]
    DuplicateTable(String),

    /// Duplicate column name
    #[error("Duplicate column name: '{column}' already exists in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// A lookup table does not have the `id` + key shape
    #[error("Lookup table '{table}' rejected: {message}")]
    LookupShape { table: String, message: String },

    // ========================================================================
    // Code Generation Errors
    // ========================================================================
    /// Code generation failed
    #[error("Code generation failed: {0}")]
    CodeGeneration(String),

    /// The OpenAPI document is malformed
    #[error("Invalid OpenAPI document: {0}")]
    InvalidDocument(String),

    /// Invalid output path
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(PathBuf),

    // ========================================================================
    // IO Errors
    // ========================================================================
    /// File IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File write error
    #[error("Failed to write file '{path}': {message}")]
    FileWrite { path: PathBuf, message: String },

    /// Directory creation failed
    #[error("Failed to create directory '{path}': {message}")]
    DirectoryCreate { path: PathBuf, message: String },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl EngineError {
    /// Create an introspection error for a named catalog query
    pub fn introspection(query: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::Introspection {
            query: query.into(),
            message: msg.into(),
        }
    }

    /// Create a schema validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    /// Create a lookup-shape error
    pub fn lookup_shape(table: impl Into<String>, msg: impl Into<String>) -> Self {
        EngineError::LookupShape {
            table: table.into(),
            message: msg.into(),
        }
    }

    /// Create a code generation error
    pub fn codegen(msg: impl Into<String>) -> Self {
        EngineError::CodeGeneration(msg.into())
    }

    /// Check if this error came from the database catalog
    pub fn is_introspection(&self) -> bool {
        matches!(
            self,
            EngineError::Introspection { .. }
                | EngineError::Connection(_)
                | EngineError::ConstraintParse { .. }
        )
    }

    /// Check if this error is a schema validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::DuplicateTable(_)
                | EngineError::DuplicateColumn { .. }
                | EngineError::LookupShape { .. }
        )
    }

    /// Check if this error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::TableNotFound(_) | EngineError::ColumnNotFound { .. }
        )
    }

    /// Check if this error is an IO error
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            EngineError::Io(_)
                | EngineError::FileWrite { .. }
                | EngineError::DirectoryCreate { .. }
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_) | EngineError::MissingConfig(_)
        )
    }
}

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introspection_error() {
        let err = EngineError::introspection("foreign_keys", "relation does not exist");
        assert!(err.is_introspection());
        assert!(!err.is_validation());
        assert_eq!(
            err.to_string(),
            "Introspection query 'foreign_keys' failed: relation does not exist"
        );
    }

    #[test]
    fn test_duplicate_column_error() {
        let err = EngineError::DuplicateColumn {
            table: "invoice".to_string(),
            column: "id".to_string(),
        };
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Duplicate column name: 'id' already exists in table 'invoice'"
        );
    }

    #[test]
    fn test_lookup_shape_error() {
        let err = EngineError::lookup_shape("order_status", "expected 2 columns, found 3");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Lookup table 'order_status' rejected: expected 2 columns, found 3"
        );
    }

    #[test]
    fn test_not_found_errors() {
        let err = EngineError::TableNotFound("ledger".to_string());
        assert!(err.is_not_found());
        assert!(!err.is_io());
        assert_eq!(err.to_string(), "Table not found: ledger");
    }

    #[test]
    fn test_io_error_classification() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(err.is_io());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(EngineError::MissingConfig("DB_NAME".into()).is_config());
        assert!(!EngineError::codegen("bad").is_config());
    }
}
