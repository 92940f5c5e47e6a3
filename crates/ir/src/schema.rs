//! The schema graph: tables plus foreign-key adjacency.

use std::collections::HashMap;

use catalyst_core::{EngineError, EngineResult, PgDataType, Validatable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::column::ColumnDescriptor;
use crate::foreign_key::{ForeignKeyEdge, ParsedConstraint, parse_constraint_def};
use crate::table::TableDescriptor;

// ============================================================================
// Catalog rows
// ============================================================================

/// One row of `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub column_default: Option<String>,
    pub is_nullable: bool,
}

/// One foreign-key row of `pg_constraint`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConstraint {
    pub table_name: String,
    pub constraint_name: String,
    /// `pg_get_constraintdef(oid)`
    pub definition: String,
}

/// Raw result of the bulk catalog queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub tables: Vec<String>,
    /// Ordered by table, then ordinal position
    pub columns: Vec<CatalogColumn>,
    /// Ordered as the catalog returned them
    pub constraints: Vec<CatalogConstraint>,
}

/// A graph plus the non-fatal warnings raised while assembling it
#[derive(Debug, Clone)]
pub struct SchemaBuild {
    pub graph: SchemaGraph,
    pub warnings: Vec<String>,
}

// ============================================================================
// SchemaGraph
// ============================================================================

/// All tables of the schema and the foreign keys between them.
///
/// Tables are kept in lexicographic order. Edges keep catalog order, which
/// fixes the order in which children and parents are enumerated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaGraph {
    tables: Vec<TableDescriptor>,
    edges: Vec<ForeignKeyEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SchemaGraph {
    /// Build a graph from descriptors.
    ///
    /// Fails on duplicate tables, invalid tables, or edges that reference
    /// unknown tables or columns.
    pub fn new(mut tables: Vec<TableDescriptor>, edges: Vec<ForeignKeyEdge>) -> EngineResult<Self> {
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        let mut index = HashMap::with_capacity(tables.len());
        for (i, table) in tables.iter().enumerate() {
            table.validate()?;
            if index.insert(table.name.clone(), i).is_some() {
                return Err(EngineError::DuplicateTable(table.name.clone()));
            }
        }

        let graph = Self {
            tables,
            edges,
            index,
        };
        for edge in &graph.edges {
            graph.check_endpoint(&edge.from_table, &edge.from_column)?;
            graph.check_endpoint(&edge.to_table, &edge.to_column)?;
        }
        Ok(graph)
    }

    /// Assemble a graph from bulk catalog rows.
    ///
    /// Composite keys and keys pointing outside the schema are dropped with a
    /// warning; anything else malformed is an error.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> EngineResult<SchemaBuild> {
        let mut warnings = Vec::new();

        let mut columns: HashMap<String, Vec<ColumnDescriptor>> = snapshot
            .tables
            .iter()
            .map(|t| (t.clone(), Vec::new()))
            .collect();
        for row in snapshot.columns {
            let Some(list) = columns.get_mut(&row.table_name) else {
                debug!(table = %row.table_name, "ignoring columns of a non-table relation");
                continue;
            };
            list.push(ColumnDescriptor {
                name: row.column_name,
                data_type: PgDataType::from_catalog(&row.data_type),
                default: row.column_default,
                nullable: row.is_nullable,
            });
        }

        let tables: Vec<TableDescriptor> = snapshot
            .tables
            .iter()
            .map(|name| {
                let cols = columns.remove(name).unwrap_or_default();
                TableDescriptor::new(name.clone(), cols)
            })
            .collect();

        let mut edges = Vec::new();
        for constraint in &snapshot.constraints {
            match parse_constraint_def(&constraint.table_name, &constraint.definition)? {
                ParsedConstraint::Edge(edge) => {
                    let known = |t: &str, c: &str| {
                        tables
                            .iter()
                            .any(|table| table.name == t && table.has_column(c))
                    };
                    if known(&edge.from_table, &edge.from_column)
                        && known(&edge.to_table, &edge.to_column)
                    {
                        edges.push(edge);
                    } else {
                        warnings.push(format!(
                            "foreign key '{}' ({}) references a relation outside the public schema; skipped",
                            constraint.constraint_name, edge
                        ));
                    }
                }
                ParsedConstraint::Composite { to_table, columns } => {
                    warnings.push(format!(
                        "foreign key '{}' on '{}' -> '{}' spans {} columns; composite keys are skipped",
                        constraint.constraint_name, constraint.table_name, to_table, columns
                    ));
                }
            }
        }

        let graph = SchemaGraph::new(tables, edges)?;
        for table in graph.tables() {
            warnings.extend(table.warnings());
        }

        Ok(SchemaBuild { graph, warnings })
    }

    fn check_endpoint(&self, table: &str, column: &str) -> EngineResult<()> {
        let descriptor = self
            .table(table)
            .ok_or_else(|| EngineError::TableNotFound(table.to_string()))?;
        if !descriptor.has_column(column) {
            return Err(EngineError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All tables, sorted by name
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// All edges, in catalog order
    pub fn edges(&self) -> &[ForeignKeyEdge] {
        &self.edges
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        match self.index.get(name) {
            Some(&i) => self.tables.get(i),
            // Deserialized graphs carry no index.
            None => self.tables.iter().find(|t| t.name == name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Edges whose referenced table is `table` (the FK lives on the child)
    pub fn children<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKeyEdge> + 'a {
        self.edges.iter().filter(move |e| e.to_table == table)
    }

    /// Edges declared on `table` (the referenced table is the parent)
    pub fn parents<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKeyEdge> + 'a {
        self.edges.iter().filter(move |e| e.from_table == table)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl Validatable for SchemaGraph {
    fn validate(&self) -> EngineResult<()> {
        for table in &self.tables {
            table.validate()?;
        }
        for edge in &self.edges {
            self.check_endpoint(&edge.from_table, &edge.from_column)?;
            self.check_endpoint(&edge.to_table, &edge.to_column)?;
        }
        Ok(())
    }
}
