//! Lookup tables materialized as static enumerations.

use std::collections::HashSet;

use catalyst_core::{EngineError, EngineResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::column::ColumnDescriptor;
use crate::table::TableDescriptor;

/// Returns true if the table name ends with one of the lookup suffixes
pub fn is_lookup_table(name: &str, suffixes: &[String]) -> bool {
    suffixes
        .iter()
        .any(|suffix| !suffix.is_empty() && name.ends_with(suffix.as_str()))
}

/// A lookup table's rows as `key -> id`, in row order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTable {
    pub table_name: String,
    /// The single non-`id` column
    pub key_column: String,
    pub mapping: IndexMap<String, i64>,
}

impl EnumTable {
    /// The key column of a lookup table.
    ///
    /// The table must consist of exactly `id` plus one other column.
    pub fn key_column(table: &TableDescriptor) -> EngineResult<&ColumnDescriptor> {
        if !table.has_column("id") {
            return Err(EngineError::lookup_shape(&table.name, "missing 'id' column"));
        }
        if table.columns.len() != 2 {
            return Err(EngineError::lookup_shape(
                &table.name,
                format!("expected 'id' plus one key column, found {} columns", table.columns.len()),
            ));
        }
        table
            .columns
            .iter()
            .find(|c| c.name != "id")
            .ok_or_else(|| EngineError::lookup_shape(&table.name, "no key column"))
    }

    /// Build the mapping from rows rendered with `row_to_json`.
    pub fn from_rows(table: &TableDescriptor, rows: &[Value]) -> EngineResult<Self> {
        let key_column = Self::key_column(table)?.name.clone();
        let mut mapping = IndexMap::with_capacity(rows.len());
        let mut ids = HashSet::with_capacity(rows.len());

        for row in rows {
            let id = row
                .get("id")
                .and_then(Value::as_i64)
                .ok_or_else(|| EngineError::lookup_shape(&table.name, "row with a non-integer 'id'"))?;
            let key = match row.get(&key_column) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => {
                    return Err(EngineError::lookup_shape(
                        &table.name,
                        format!("row {id} has no scalar '{key_column}' value"),
                    ));
                }
            };
            if !ids.insert(id) {
                return Err(EngineError::lookup_shape(&table.name, format!("duplicate id {id}")));
            }
            if mapping.insert(key.clone(), id).is_some() {
                return Err(EngineError::lookup_shape(
                    &table.name,
                    format!("duplicate key '{key}'"),
                ));
            }
        }

        Ok(Self {
            table_name: table.name.clone(),
            key_column,
            mapping,
        })
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.mapping.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn order_status() -> TableDescriptor {
        TableDescriptor::new(
            "order_status",
            vec![ColumnDescriptor::bigint("id"), ColumnDescriptor::text("name")],
        )
    }

    #[test]
    fn test_suffix_matching() {
        let suffixes = vec!["_status".to_string()];
        assert!(is_lookup_table("order_status", &suffixes));
        assert!(!is_lookup_table("status_history", &suffixes));
        assert!(!is_lookup_table("order_status", &[String::new()]));
    }

    #[test]
    fn test_builds_mapping_in_row_order() {
        let rows = vec![json!({"id": 1, "name": "open"}), json!({"id": 2, "name": "closed"})];
        let table = EnumTable::from_rows(&order_status(), &rows).unwrap();
        assert_eq!(table.key_column, "name");
        assert_eq!(table.get("open"), Some(1));
        assert_eq!(table.get("closed"), Some(2));
        let keys: Vec<&str> = table.mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["open", "closed"]);
    }

    #[test]
    fn test_rejects_wide_tables() {
        let table = TableDescriptor::new(
            "payment_status",
            vec![
                ColumnDescriptor::bigint("id"),
                ColumnDescriptor::text("name"),
                ColumnDescriptor::text("label"),
            ],
        );
        let err = EnumTable::from_rows(&table, &[]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_rejects_duplicate_and_null_keys() {
        let rows = vec![json!({"id": 1, "name": "open"}), json!({"id": 2, "name": "open"})];
        assert!(EnumTable::from_rows(&order_status(), &rows).is_err());

        let rows = vec![json!({"id": 1, "name": null})];
        assert!(EnumTable::from_rows(&order_status(), &rows).is_err());
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let rows = vec![json!({"id": 1, "name": "open"}), json!({"id": 1, "name": "closed"})];
        let err = EnumTable::from_rows(&order_status(), &rows).unwrap_err();
        assert!(err.to_string().contains("duplicate id 1"));
    }

    #[test]
    fn test_empty_lookup_table_is_allowed() {
        let table = EnumTable::from_rows(&order_status(), &[]).unwrap();
        assert!(table.is_empty());
    }
}
