//! # Join-Path Resolver
//!
//! Finds a chain of foreign keys from an origin table to a destination table
//! and renders it as SQL `JOIN` fragments.
//!
//! The search is a depth-first walk over the [`SchemaGraph`]. At every table
//! the children (tables whose foreign key references it) are explored before
//! the parents (tables it references), each in catalog order. A table is
//! never entered twice on the same path and the origin is never re-entered,
//! so cycles terminate. The first path reached is returned; it is not
//! necessarily the shortest.

use catalyst_core::quote_ident;
use catalyst_ir::SchemaGraph;
use serde::{Deserialize, Serialize};

/// A resolved join chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPath {
    /// Tables joined, in traversal order; excludes the origin, no repeats
    pub table_chain: Vec<String>,

    /// One `JOIN ... ON ...` fragment per table in `table_chain`
    pub join_clauses: Vec<String>,
}

impl JoinPath {
    /// The fragments concatenated in traversal order
    pub fn render(&self) -> String {
        self.join_clauses.join(" ")
    }

    pub fn len(&self) -> usize {
        self.table_chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table_chain.is_empty()
    }

    fn push(&mut self, table: &str, column: &str, other_table: &str, other_column: &str) {
        let joined = quote_ident(table);
        self.join_clauses.push(format!(
            "JOIN {joined} ON {joined}.{} = {}.{}",
            quote_ident(column),
            quote_ident(other_table),
            quote_ident(other_column)
        ));
        self.table_chain.push(table.to_string());
    }

    fn pop(&mut self) {
        self.table_chain.pop();
        self.join_clauses.pop();
    }

    fn contains(&self, table: &str) -> bool {
        self.table_chain.iter().any(|t| t == table)
    }
}

/// Resolve a join path from `origin` to `destination`.
///
/// Returns `None` when either table is unknown or no path exists. When the
/// two are the same table the path is empty.
pub fn resolve(graph: &SchemaGraph, origin: &str, destination: &str) -> Option<JoinPath> {
    if !graph.contains(origin) || !graph.contains(destination) {
        return None;
    }
    if origin == destination {
        return Some(JoinPath::default());
    }

    let mut path = JoinPath::default();
    if search(graph, origin, destination, origin, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn search(
    graph: &SchemaGraph,
    current: &str,
    destination: &str,
    origin: &str,
    path: &mut JoinPath,
) -> bool {
    // children: edge lives on the child and references `current`
    for edge in graph.children(current) {
        let next = edge.from_table.as_str();
        if next == origin || path.contains(next) {
            continue;
        }
        path.push(next, &edge.from_column, current, &edge.to_column);
        if next == destination || search(graph, next, destination, origin, path) {
            return true;
        }
        path.pop();
    }

    // parents: edge lives on `current` and references the parent
    for edge in graph.parents(current) {
        let next = edge.to_table.as_str();
        if next == origin || path.contains(next) {
            continue;
        }
        path.push(next, &edge.to_column, current, &edge.from_column);
        if next == destination || search(graph, next, destination, origin, path) {
            return true;
        }
        path.pop();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalyst_ir::{ColumnDescriptor, ForeignKeyEdge, TableDescriptor};
    use pretty_assertions::assert_eq;

    fn table(name: &str, columns: &[&str]) -> TableDescriptor {
        TableDescriptor::new(
            name,
            columns.iter().map(|c| ColumnDescriptor::bigint(*c)).collect(),
        )
    }

    fn billing() -> SchemaGraph {
        SchemaGraph::new(
            vec![
                table("user", &["id"]),
                table("account", &["id", "user_id"]),
                table("invoice", &["id", "account_id"]),
            ],
            vec![
                ForeignKeyEdge::new("account", "user_id", "user", "id"),
                ForeignKeyEdge::new("invoice", "account_id", "account", "id"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_invoice_reaches_user_through_account() {
        let path = resolve(&billing(), "invoice", "user").unwrap();
        assert_eq!(path.table_chain, vec!["account", "user"]);
        assert_eq!(
            path.join_clauses,
            vec![
                "JOIN account ON account.id = invoice.account_id",
                "JOIN \"user\" ON \"user\".id = account.user_id",
            ]
        );
        assert_eq!(
            path.render(),
            "JOIN account ON account.id = invoice.account_id JOIN \"user\" ON \"user\".id = account.user_id"
        );
    }

    #[test]
    fn test_descends_into_children() {
        // user -> account is a child edge from the user's point of view
        let path = resolve(&billing(), "user", "invoice").unwrap();
        assert_eq!(path.table_chain, vec!["account", "invoice"]);
        assert_eq!(
            path.join_clauses[0],
            "JOIN account ON account.user_id = \"user\".id"
        );
        assert_eq!(
            path.join_clauses[1],
            "JOIN invoice ON invoice.account_id = account.id"
        );
    }

    #[test]
    fn test_missing_path_is_none() {
        let graph = SchemaGraph::new(
            vec![table("user", &["id"]), table("audit_log", &["id"])],
            vec![],
        )
        .unwrap();
        assert_eq!(resolve(&graph, "audit_log", "user"), None);
        assert_eq!(resolve(&graph, "ghost", "user"), None);
    }

    #[test]
    fn test_same_table_is_empty_path() {
        let path = resolve(&billing(), "user", "user").unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_cycles_terminate_without_repeats() {
        // a <-> b mutual references, b self-reference, and no route to `user`
        let graph = SchemaGraph::new(
            vec![
                table("a", &["id", "b_id"]),
                table("b", &["id", "a_id", "parent_id"]),
                table("user", &["id"]),
            ],
            vec![
                ForeignKeyEdge::new("a", "b_id", "b", "id"),
                ForeignKeyEdge::new("b", "a_id", "a", "id"),
                ForeignKeyEdge::new("b", "parent_id", "b", "id"),
            ],
        )
        .unwrap();
        assert_eq!(resolve(&graph, "a", "user"), None);
    }

    #[test]
    fn test_cyclic_graph_with_path() {
        let graph = SchemaGraph::new(
            vec![
                table("a", &["id", "b_id"]),
                table("b", &["id", "a_id", "user_id"]),
                table("user", &["id"]),
            ],
            vec![
                ForeignKeyEdge::new("a", "b_id", "b", "id"),
                ForeignKeyEdge::new("b", "a_id", "a", "id"),
                ForeignKeyEdge::new("b", "user_id", "user", "id"),
            ],
        )
        .unwrap();
        let path = resolve(&graph, "a", "user").unwrap();
        assert_eq!(path.table_chain, vec!["b", "user"]);
        let mut unique = path.table_chain.clone();
        unique.dedup();
        assert_eq!(unique.len(), path.len());
        assert!(!path.table_chain.contains(&"a".to_string()));
    }

    #[test]
    fn test_children_are_tried_before_parents() {
        // origin `hub` has a child `spoke` and a parent `owner`; both reach `user`
        let graph = SchemaGraph::new(
            vec![
                table("hub", &["id", "owner_id"]),
                table("spoke", &["id", "hub_id", "user_id"]),
                table("owner", &["id", "user_id"]),
                table("user", &["id"]),
            ],
            vec![
                ForeignKeyEdge::new("hub", "owner_id", "owner", "id"),
                ForeignKeyEdge::new("spoke", "hub_id", "hub", "id"),
                ForeignKeyEdge::new("spoke", "user_id", "user", "id"),
                ForeignKeyEdge::new("owner", "user_id", "user", "id"),
            ],
        )
        .unwrap();
        let path = resolve(&graph, "hub", "user").unwrap();
        assert_eq!(path.table_chain, vec!["spoke", "user"]);
    }
}
