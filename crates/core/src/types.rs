//! Core type definitions for Catalyst
//!
//! This module contains the fundamental types used throughout the generator:
//! PostgreSQL column types as reported by `information_schema`, the identity
//! strategy of a table, and the HTTP vocabulary of synthesized endpoints.

use serde::{Deserialize, Serialize};

// ============================================================================
// PostgreSQL Data Types
// ============================================================================

/// Column data types as reported by `information_schema.columns.data_type`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "String", from = "String")]
pub enum PgDataType {
    /// `text`
    #[default]
    Text,
    /// `character varying`
    Varchar,
    /// `bigint`
    Bigint,
    /// `integer`
    Integer,
    /// `smallint`
    Smallint,
    /// `uuid`
    Uuid,
    /// `boolean`
    Boolean,
    /// `double precision`
    DoublePrecision,
    /// `real`
    Real,
    /// `json`
    Json,
    /// `jsonb`
    Jsonb,
    /// Anything else, kept verbatim (`numeric`, `date`, `timestamp with time zone`, ...)
    Other(String),
}

impl PgDataType {
    /// Parse a catalog type name
    pub fn from_catalog(name: &str) -> Self {
        match name.trim() {
            "text" => PgDataType::Text,
            "character varying" => PgDataType::Varchar,
            "bigint" => PgDataType::Bigint,
            "integer" => PgDataType::Integer,
            "smallint" => PgDataType::Smallint,
            "uuid" => PgDataType::Uuid,
            "boolean" => PgDataType::Boolean,
            "double precision" => PgDataType::DoublePrecision,
            "real" => PgDataType::Real,
            "json" => PgDataType::Json,
            "jsonb" => PgDataType::Jsonb,
            other => PgDataType::Other(other.to_string()),
        }
    }

    /// The catalog spelling of this type
    pub fn catalog_name(&self) -> &str {
        match self {
            PgDataType::Text => "text",
            PgDataType::Varchar => "character varying",
            PgDataType::Bigint => "bigint",
            PgDataType::Integer => "integer",
            PgDataType::Smallint => "smallint",
            PgDataType::Uuid => "uuid",
            PgDataType::Boolean => "boolean",
            PgDataType::DoublePrecision => "double precision",
            PgDataType::Real => "real",
            PgDataType::Json => "json",
            PgDataType::Jsonb => "jsonb",
            PgDataType::Other(name) => name,
        }
    }

    /// Whether the list filter searches this column.
    ///
    /// Only `text` columns participate; `character varying` does not.
    pub fn is_text(&self) -> bool {
        matches!(self, PgDataType::Text)
    }

    /// OpenAPI `type` for this column.
    ///
    /// `text`, `bigint` and `uuid` are mapped; everything else is emitted as
    /// its catalog name.
    pub fn openapi_type(&self) -> &str {
        match self {
            PgDataType::Text => "string",
            PgDataType::Bigint => "integer",
            PgDataType::Uuid => "string",
            other => other.catalog_name(),
        }
    }

    /// OpenAPI `format`, if any
    pub fn openapi_format(&self) -> Option<&'static str> {
        match self {
            PgDataType::Uuid => Some("uuid"),
            _ => None,
        }
    }

    /// Example value rendered into request and component schemas
    pub fn openapi_example(&self, column_name: &str) -> serde_json::Value {
        match self {
            PgDataType::Text => serde_json::Value::String(column_name.to_string()),
            PgDataType::Bigint => serde_json::Value::from(0),
            PgDataType::Uuid => serde_json::Value::String(uuid::Uuid::nil().to_string()),
            _ => serde_json::Value::String(String::new()),
        }
    }

    /// Rust type used for bound parameters in generated code
    pub fn rust_type(&self) -> &'static str {
        match self {
            PgDataType::Text | PgDataType::Varchar | PgDataType::Other(_) => "String",
            PgDataType::Bigint => "i64",
            PgDataType::Integer => "i32",
            PgDataType::Smallint => "i16",
            PgDataType::Uuid => "uuid::Uuid",
            PgDataType::Boolean => "bool",
            PgDataType::DoublePrecision => "f64",
            PgDataType::Real => "f32",
            PgDataType::Json | PgDataType::Jsonb => "serde_json::Value",
        }
    }

    /// SQL cast applied to a bound placeholder.
    ///
    /// Types without a native Rust mapping are bound as text and cast
    /// server-side.
    pub fn placeholder_cast(&self) -> Option<&str> {
        match self {
            PgDataType::Other(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for PgDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.catalog_name())
    }
}

impl From<String> for PgDataType {
    fn from(value: String) -> Self {
        PgDataType::from_catalog(&value)
    }
}

impl From<PgDataType> for String {
    fn from(value: PgDataType) -> Self {
        value.catalog_name().to_string()
    }
}

// ============================================================================
// Identity Modes
// ============================================================================

/// How rows of a table are addressed individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdentityMode {
    /// Addressed by the `uuid` column; `id` is hidden
    Uuid,
    /// Addressed by the `id` column
    Id,
    /// No single-record addressing
    #[default]
    None,
}

impl IdentityMode {
    /// Name of the identity column, if any
    pub fn column(&self) -> Option<&'static str> {
        match self {
            IdentityMode::Uuid => Some("uuid"),
            IdentityMode::Id => Some("id"),
            IdentityMode::None => None,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            IdentityMode::Uuid => "UUID",
            IdentityMode::Id => "ID",
            IdentityMode::None => "NONE",
        }
    }
}

impl std::fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// HTTP Vocabulary
// ============================================================================

/// HTTP methods used by synthesized endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Lowercase key used in OpenAPI path items
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
        }
    }

    /// Parse an OpenAPI path-item key
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "patch" => Some(HttpMethod::Patch),
            "delete" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Whether the method carries a request body and touches component schemas
    pub fn is_mutating(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_str().to_ascii_uppercase())
    }
}

/// Where a parameter is carried on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Body => "body",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_round_trip() {
        for name in ["text", "bigint", "uuid", "timestamp with time zone", "numeric"] {
            assert_eq!(PgDataType::from_catalog(name).catalog_name(), name);
        }
    }

    #[test]
    fn test_openapi_type_mapping() {
        assert_eq!(PgDataType::Text.openapi_type(), "string");
        assert_eq!(PgDataType::Bigint.openapi_type(), "integer");
        assert_eq!(PgDataType::Uuid.openapi_type(), "string");
        assert_eq!(PgDataType::Boolean.openapi_type(), "boolean");
        assert_eq!(
            PgDataType::from_catalog("timestamp with time zone").openapi_type(),
            "timestamp with time zone"
        );
    }

    #[test]
    fn test_openapi_examples() {
        assert_eq!(
            PgDataType::Text.openapi_example("note"),
            serde_json::json!("note")
        );
        assert_eq!(PgDataType::Bigint.openapi_example("total"), serde_json::json!(0));
        assert_eq!(
            PgDataType::Uuid.openapi_example("uuid"),
            serde_json::json!("00000000-0000-0000-0000-000000000000")
        );
        assert_eq!(PgDataType::Boolean.openapi_example("paid"), serde_json::json!(""));
    }

    #[test]
    fn test_only_text_is_filterable() {
        assert!(PgDataType::Text.is_text());
        assert!(!PgDataType::Varchar.is_text());
        assert!(!PgDataType::Uuid.is_text());
    }

    #[test]
    fn test_rust_types_and_casts() {
        assert_eq!(PgDataType::Bigint.rust_type(), "i64");
        assert_eq!(PgDataType::Uuid.rust_type(), "uuid::Uuid");
        let date = PgDataType::from_catalog("date");
        assert_eq!(date.rust_type(), "String");
        assert_eq!(date.placeholder_cast(), Some("date"));
        assert_eq!(PgDataType::Text.placeholder_cast(), None);
    }

    #[test]
    fn test_serde_as_catalog_name() {
        let json = serde_json::to_string(&PgDataType::DoublePrecision).unwrap();
        assert_eq!(json, "\"double precision\"");
        let parsed: PgDataType = serde_json::from_str("\"jsonb\"").unwrap();
        assert_eq!(parsed, PgDataType::Jsonb);
    }

    #[test]
    fn test_identity_mode_columns() {
        assert_eq!(IdentityMode::Uuid.column(), Some("uuid"));
        assert_eq!(IdentityMode::Id.column(), Some("id"));
        assert_eq!(IdentityMode::None.column(), None);
        assert_eq!(IdentityMode::Uuid.to_string(), "UUID");
    }

    #[test]
    fn test_http_method() {
        assert_eq!(HttpMethod::parse("POST"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::parse("trace"), None);
        assert!(HttpMethod::Put.is_mutating());
        assert!(!HttpMethod::Get.is_mutating());
        assert_eq!(HttpMethod::Get.to_string(), "GET");
    }
}
