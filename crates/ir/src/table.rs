//! Table descriptors and identity classification.

use std::collections::HashSet;

use catalyst_core::{EngineError, EngineResult, IdentityMode, Validatable};
use serde::{Deserialize, Serialize};

use crate::column::ColumnDescriptor;

/// Classify how rows of a table are addressed.
///
/// A `uuid` column wins even when `id` is also present; otherwise `id`;
/// otherwise the table has no single-record identity.
pub fn classify(columns: &[ColumnDescriptor]) -> IdentityMode {
    if columns.iter().any(|c| c.name == "uuid") {
        IdentityMode::Uuid
    } else if columns.iter().any(|c| c.name == "id") {
        IdentityMode::Id
    } else {
        IdentityMode::None
    }
}

/// An introspected table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name as stored in the catalog (unquoted)
    pub name: String,

    /// Columns in ordinal order
    pub columns: Vec<ColumnDescriptor>,

    /// Derived from `columns` at construction
    pub identity_mode: IdentityMode,
}

impl TableDescriptor {
    /// Create a table and classify its identity mode
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        let identity_mode = classify(&columns);
        Self {
            name: name.into(),
            columns,
            identity_mode,
        }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The identity column (`uuid` or `id`), if any
    pub fn identity_column(&self) -> Option<&ColumnDescriptor> {
        self.identity_mode.column().and_then(|name| self.column(name))
    }

    /// Columns returned by reads.
    ///
    /// `id` is hidden when the table is addressed by `uuid`.
    pub fn projected_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !(self.identity_mode == IdentityMode::Uuid && c.name == "id"))
            .collect()
    }

    /// Columns supplied by insert and update bodies, in ordinal order.
    pub fn writable_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.is_identity()).collect()
    }

    /// Projected `text` columns searched by the list filter
    pub fn text_columns(&self) -> Vec<&ColumnDescriptor> {
        self.projected_columns()
            .into_iter()
            .filter(|c| c.data_type.is_text())
            .collect()
    }

    /// Non-fatal observations about this table's shape
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.identity_mode == IdentityMode::None {
            warnings.push(format!(
                "table '{}' has neither 'id' nor 'uuid'; only list and insert are generated",
                self.name
            ));
        }
        if let Some(uuid) = self.column("uuid") {
            if !uuid.has_default() {
                warnings.push(format!(
                    "table '{}' has a 'uuid' column without a default; inserts rely on the database to fill it",
                    self.name
                ));
            }
        }
        warnings
    }
}

impl Validatable for TableDescriptor {
    fn validate(&self) -> EngineResult<()> {
        if self.name.is_empty() {
            return Err(EngineError::validation("table name cannot be empty"));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(EngineError::validation(format!(
                    "table '{}' has a column with an empty name",
                    self.name
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EngineError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }
}
