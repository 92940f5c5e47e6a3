//! Column descriptors.

use catalyst_core::PgDataType;
use serde::{Deserialize, Serialize};

/// A column of an introspected table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name, unique within its table
    pub name: String,

    /// Catalog data type
    pub data_type: PgDataType,

    /// Default expression as reported by the catalog (`nextval(...)`, `gen_random_uuid()`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Whether the column accepts NULL
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Create a non-nullable column without a default
    pub fn new(name: impl Into<String>, data_type: PgDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default: None,
            nullable: false,
        }
    }

    /// Shorthand for a `text` column
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, PgDataType::Text)
    }

    /// Shorthand for a `bigint` column
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, PgDataType::Bigint)
    }

    /// Shorthand for a `uuid` column
    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, PgDataType::Uuid)
    }

    /// Set the default expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark the column nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// `id` or `uuid`
    pub fn is_identity(&self) -> bool {
        self.name == "id" || self.name == "uuid"
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_columns() {
        assert!(ColumnDescriptor::bigint("id").is_identity());
        assert!(ColumnDescriptor::uuid("uuid").is_identity());
        assert!(!ColumnDescriptor::bigint("account_id").is_identity());
    }

    #[test]
    fn test_builder_sets_default_and_nullability() {
        let col = ColumnDescriptor::uuid("uuid")
            .with_default("gen_random_uuid()")
            .nullable();
        assert!(col.has_default());
        assert!(col.nullable);
        assert_eq!(col.data_type, PgDataType::Uuid);
    }
}
