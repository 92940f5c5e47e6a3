//! SQL templates for synthesized endpoints.
//!
//! All statements use positional placeholders; the bind order of each
//! statement is recorded next to it as [`SqlParam`](crate::SqlParam)s.
//! Column references are qualified with their table so that join blocks
//! never make them ambiguous.

use catalyst_core::quote_ident;
use catalyst_ir::{ColumnDescriptor, ForeignKeyEdge, TableDescriptor};

use crate::join_path::JoinPath;

/// Alias of the parent table in list-children statements
pub const PARENT_ALIAS: &str = "__parent";

/// `table.column` with both parts quoted when needed
pub fn qualified(table: &str, column: &str) -> String {
    format!("{}.{}", quote_ident(table), quote_ident(column))
}

/// Projected columns of `table`, table-qualified
pub fn select_list(table: &TableDescriptor) -> String {
    let columns = table.projected_columns();
    if columns.is_empty() {
        return format!("{}.*", quote_ident(&table.name));
    }
    columns
        .iter()
        .map(|c| qualified(&table.name, &c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Case-insensitive substring filter over every `text` column.
///
/// Without text columns the predicate is a tautology that still references
/// the placeholder so the parameter count is unchanged.
pub fn filter_predicate(table: &TableDescriptor, placeholder: usize) -> String {
    let text = table.text_columns();
    if text.is_empty() {
        return format!("(${placeholder}::text is not null or true)");
    }
    let terms: Vec<String> = text
        .iter()
        .map(|c| format!("{} ilike ${placeholder}", qualified(&table.name, &c.name)))
        .collect();
    format!("({})", terms.join(" or "))
}

/// A bound placeholder, cast server-side for types bound as text
pub fn placeholder(column: &ColumnDescriptor, index: usize) -> String {
    match column.data_type.placeholder_cast() {
        Some(cast) => format!("${index}::{cast}"),
        None => format!("${index}"),
    }
}

/// `GET /{table}/`: binds `[filter, limit, offset]`
pub fn list(table: &TableDescriptor, restriction: Option<&JoinPath>) -> String {
    let mut sql = format!("select {} from {}", select_list(table), quote_ident(&table.name));
    if let Some(path) = restriction.filter(|p| !p.is_empty()) {
        sql.push(' ');
        sql.push_str(&path.render());
    }
    sql.push_str(&format!(
        " where {} limit $2 offset $3",
        filter_predicate(table, 1)
    ));
    sql
}

/// `GET /{table}/{key}`: binds `[key]`
pub fn get_by(table: &TableDescriptor, key: &str) -> String {
    format!(
        "select {} from {} where {} = {}",
        select_list(table),
        quote_ident(&table.name),
        qualified(&table.name, key),
        key_placeholder(table, key, 1)
    )
}

fn key_placeholder(table: &TableDescriptor, key: &str, index: usize) -> String {
    match table.column(key) {
        Some(column) => placeholder(column, index),
        None => format!("${index}"),
    }
}

/// `GET /{parent}/{key}/{child}`: binds `[key, filter, limit, offset]`
pub fn list_children(
    parent: &TableDescriptor,
    child: &TableDescriptor,
    edge: &ForeignKeyEdge,
    key: &str,
) -> String {
    format!(
        "select {} from {} join {} as {alias} on {} = {alias}.{} where {alias}.{} = {} and {} limit $3 offset $4",
        select_list(child),
        quote_ident(&child.name),
        quote_ident(&parent.name),
        qualified(&child.name, &edge.from_column),
        quote_ident(&edge.to_column),
        quote_ident(key),
        key_placeholder(parent, key, 1),
        filter_predicate(child, 2),
        alias = PARENT_ALIAS,
    )
}

/// `POST /{table}/`: binds the writable columns in ordinal order
pub fn insert(table: &TableDescriptor) -> String {
    let writable = table.writable_columns();
    let name = quote_ident(&table.name);
    if writable.is_empty() {
        return format!(
            "insert into {name} default values returning {}",
            select_list(table)
        );
    }
    let columns: Vec<String> = writable.iter().map(|c| quote_ident(&c.name)).collect();
    let values: Vec<String> = writable
        .iter()
        .enumerate()
        .map(|(i, c)| placeholder(c, i + 1))
        .collect();
    format!(
        "insert into {name} ({}) values ({}) returning {}",
        columns.join(", "),
        values.join(", "),
        select_list(table)
    )
}

/// `PUT /{table}/{uuid}`: binds the writable columns, then the uuid.
///
/// Returns `None` when the table has nothing to update.
pub fn update_by_uuid(table: &TableDescriptor) -> Option<String> {
    let writable = table.writable_columns();
    if writable.is_empty() {
        return None;
    }
    let assignments: Vec<String> = writable
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = {}", quote_ident(&c.name), placeholder(c, i + 1)))
        .collect();
    Some(format!(
        "update {} set {} where {} = ${} returning {}",
        quote_ident(&table.name),
        assignments.join(", "),
        qualified(&table.name, "uuid"),
        writable.len() + 1,
        select_list(table)
    ))
}

/// Wrap a `select` so each row comes back as one JSON object.
pub fn json_rows(select: &str) -> String {
    format!("select row_to_json(r) from ({select}) r")
}

/// Wrap an `insert ... returning` / `update ... returning` likewise.
pub fn json_returning(statement: &str) -> String {
    format!("with r as ({statement}) select row_to_json(r) from r")
}
