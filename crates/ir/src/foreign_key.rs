//! Foreign-key edges and `pg_get_constraintdef` parsing.

use std::sync::LazyLock;

use catalyst_core::ident::unquote_ident;
use catalyst_core::{EngineError, EngineResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single-column foreign key: `from_table.from_column -> to_table.to_column`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// The referencing (child) table
    pub from_table: String,
    pub from_column: String,
    /// The referenced (parent) table
    pub to_table: String,
    pub to_column: String,
}

impl ForeignKeyEdge {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.from_table == self.to_table
    }
}

impl std::fmt::Display for ForeignKeyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.from_table, self.from_column, self.to_table, self.to_column
        )
    }
}

/// Outcome of parsing one constraint definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedConstraint {
    /// A single-column key
    Edge(ForeignKeyEdge),
    /// A multi-column key; not representable as an edge
    Composite { to_table: String, columns: usize },
}

static FOREIGN_KEY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^FOREIGN KEY \((?P<from>[^)]*)\) REFERENCES (?P<target>(?:"(?:[^"]|"")*"|[^\s("])+(?:\.(?:"(?:[^"]|"")*"|[^\s("])+)?)\((?P<to>[^)]*)\)"#,
    )
    .expect("foreign key pattern is valid")
});

/// Parse a `pg_get_constraintdef` rendering such as
/// `FOREIGN KEY (account_id) REFERENCES account(id) ON DELETE CASCADE`.
pub fn parse_constraint_def(table: &str, definition: &str) -> EngineResult<ParsedConstraint> {
    let caps = FOREIGN_KEY_DEF
        .captures(definition.trim())
        .ok_or_else(|| EngineError::ConstraintParse {
            table: table.to_string(),
            definition: definition.to_string(),
        })?;

    let from = split_columns(&caps["from"]);
    let to = split_columns(&caps["to"]);
    let to_table = target_table(&caps["target"]);

    if from.len() != to.len() || from.is_empty() {
        return Err(EngineError::ConstraintParse {
            table: table.to_string(),
            definition: definition.to_string(),
        });
    }
    if from.len() > 1 {
        return Ok(ParsedConstraint::Composite {
            to_table,
            columns: from.len(),
        });
    }

    Ok(ParsedConstraint::Edge(ForeignKeyEdge::new(
        table,
        &from[0],
        to_table,
        &to[0],
    )))
}

fn split_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(unquote_ident)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Drop a `public.` qualifier; other schemas are kept so the edge is rejected later.
fn target_table(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("public.") {
        Some(rest) => unquote_ident(rest),
        None if raw.starts_with('"') => unquote_ident(raw),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(table: &str, def: &str) -> ForeignKeyEdge {
        match parse_constraint_def(table, def).unwrap() {
            ParsedConstraint::Edge(edge) => edge,
            other => panic!("expected edge, got {other:?}"),
        }
    }

    #[test]
    fn test_parses_simple_definition() {
        let e = edge("invoice", "FOREIGN KEY (account_id) REFERENCES account(id)");
        assert_eq!(e, ForeignKeyEdge::new("invoice", "account_id", "account", "id"));
        assert!(!e.is_self_reference());
    }

    #[test]
    fn test_parses_quoted_reserved_target_and_actions() {
        let e = edge(
            "account",
            "FOREIGN KEY (user_id) REFERENCES \"user\"(id) ON UPDATE CASCADE ON DELETE SET NULL",
        );
        assert_eq!(e.to_table, "user");
        assert_eq!(e.to_column, "id");
    }

    #[test]
    fn test_strips_public_schema() {
        let e = edge("invoice", "FOREIGN KEY (account_id) REFERENCES public.account(id)");
        assert_eq!(e.to_table, "account");
    }

    #[test]
    fn test_self_reference() {
        let e = edge("employee", "FOREIGN KEY (manager_id) REFERENCES employee(id)");
        assert!(e.is_self_reference());
    }

    #[test]
    fn test_composite_keys_are_reported() {
        let parsed = parse_constraint_def(
            "line_item",
            "FOREIGN KEY (order_id, order_rev) REFERENCES \"order\"(id, rev)",
        )
        .unwrap();
        assert_eq!(
            parsed,
            ParsedConstraint::Composite {
                to_table: "order".to_string(),
                columns: 2
            }
        );
    }

    #[test]
    fn test_rejects_other_constraints() {
        let err = parse_constraint_def("invoice", "CHECK ((total >= 0))").unwrap_err();
        assert!(err.is_introspection());
    }
}
