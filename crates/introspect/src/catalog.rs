//! # Schema Inspector
//!
//! Three bulk, read-only catalog queries build the whole [`SchemaGraph`]:
//!
//! ```text
//! pg_tables                   ──► table names (public, sorted)
//! information_schema.columns  ──► columns in ordinal order
//! pg_constraint (contype = f) ──► FOREIGN KEY definitions
//! ```
//!
//! Lookup tables are then read row by row as JSON.

use catalyst_core::{EngineError, EngineResult, quote_ident};
use catalyst_ir::{
    CatalogColumn, CatalogConstraint, CatalogSnapshot, EnumTable, SchemaBuild, SchemaGraph,
    is_lookup_table,
};
use serde_json::Value;
use sqlx::PgPool;

pub const TABLES_SQL: &str = "\
select tablename::text
from pg_tables
where schemaname = 'public'
order by tablename";

pub const COLUMNS_SQL: &str = "\
select table_name::text,
       column_name::text,
       case when data_type in ('ARRAY', 'USER-DEFINED') then udt_name::text
            else data_type::text end,
       column_default::text,
       is_nullable = 'YES'
from information_schema.columns
where table_schema = 'public'
order by table_name, ordinal_position";

pub const FOREIGN_KEYS_SQL: &str = "\
select cl.relname::text,
       con.conname::text,
       pg_get_constraintdef(con.oid)
from pg_constraint con
join pg_class cl on cl.oid = con.conrelid
where con.contype = 'f'
  and con.connamespace = 'public'::regnamespace
order by cl.relname, con.conname";

/// Every row of a lookup table as a JSON object, by id
pub fn lookup_rows_sql(table: &str) -> String {
    format!(
        "select row_to_json(t) from {} t order by id",
        quote_ident(table)
    )
}

type ColumnRow = (String, String, String, Option<String>, bool);
type ConstraintRow = (String, String, String);

fn column_from_row((table_name, column_name, data_type, column_default, is_nullable): ColumnRow) -> CatalogColumn {
    CatalogColumn {
        table_name,
        column_name,
        data_type,
        column_default,
        is_nullable,
    }
}

fn constraint_from_row((table_name, constraint_name, definition): ConstraintRow) -> CatalogConstraint {
    CatalogConstraint {
        table_name,
        constraint_name,
        definition,
    }
}

fn query_error(sql: &str) -> impl FnOnce(sqlx::Error) -> EngineError + '_ {
    move |e| EngineError::introspection(first_line(sql), e.to_string())
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql).trim()
}

/// Result of a full inspection
#[derive(Debug, Clone)]
pub struct Inspection {
    pub graph: SchemaGraph,
    pub enums: Vec<EnumTable>,
    /// Schema and lookup-table warnings, in discovery order
    pub warnings: Vec<String>,
}

/// Read-only access to the `public` schema catalog
#[derive(Debug, Clone)]
pub struct SchemaInspector<'a> {
    pool: &'a PgPool,
    debug: bool,
}

impl<'a> SchemaInspector<'a> {
    /// `debug` logs every statement at debug level (`DB_DEBUG`).
    pub fn new(pool: &'a PgPool, debug: bool) -> Self {
        Self { pool, debug }
    }

    fn log(&self, sql: &str) {
        if self.debug {
            tracing::debug!(sql = %sql, "catalog query");
        }
    }

    /// Raw catalog rows.
    pub async fn snapshot(&self) -> EngineResult<CatalogSnapshot> {
        self.log(TABLES_SQL);
        let tables: Vec<String> = sqlx::query_scalar(TABLES_SQL)
            .fetch_all(self.pool)
            .await
            .map_err(query_error(TABLES_SQL))?;

        self.log(COLUMNS_SQL);
        let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL)
            .fetch_all(self.pool)
            .await
            .map_err(query_error(COLUMNS_SQL))?;

        self.log(FOREIGN_KEYS_SQL);
        let constraints: Vec<ConstraintRow> = sqlx::query_as(FOREIGN_KEYS_SQL)
            .fetch_all(self.pool)
            .await
            .map_err(query_error(FOREIGN_KEYS_SQL))?;

        tracing::debug!(
            tables = tables.len(),
            columns = columns.len(),
            foreign_keys = constraints.len(),
            "catalog read"
        );

        Ok(CatalogSnapshot {
            tables,
            columns: columns.into_iter().map(column_from_row).collect(),
            constraints: constraints.into_iter().map(constraint_from_row).collect(),
        })
    }

    /// The schema graph plus assembly warnings.
    pub async fn schema(&self) -> EngineResult<SchemaBuild> {
        SchemaGraph::from_snapshot(self.snapshot().await?)
    }

    /// Rows of one table rendered with `row_to_json`.
    pub async fn lookup_rows(&self, table: &str) -> EngineResult<Vec<Value>> {
        let sql = lookup_rows_sql(table);
        self.log(&sql);
        sqlx::query_scalar::<_, Value>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(query_error(&sql))
    }

    /// Materialize every lookup table of `graph`.
    ///
    /// Tables of the wrong shape are skipped with a warning; query failures
    /// abort.
    pub async fn lookup_enums(
        &self,
        graph: &SchemaGraph,
        suffixes: &[String],
    ) -> EngineResult<(Vec<EnumTable>, Vec<String>)> {
        let mut enums = Vec::new();
        let mut warnings = Vec::new();

        for table in graph.tables() {
            if !is_lookup_table(&table.name, suffixes) {
                continue;
            }
            if let Err(e) = EnumTable::key_column(table) {
                warnings.push(e.to_string());
                continue;
            }
            let rows = self.lookup_rows(&table.name).await?;
            match EnumTable::from_rows(table, &rows) {
                Ok(lookup) => {
                    tracing::debug!(table = %table.name, entries = lookup.len(), "lookup table read");
                    enums.push(lookup);
                }
                Err(e) => warnings.push(e.to_string()),
            }
        }

        Ok((enums, warnings))
    }

    /// Graph, lookup enums and every warning raised on the way.
    pub async fn inspect(&self, suffixes: &[String]) -> EngineResult<Inspection> {
        let SchemaBuild { graph, mut warnings } = self.schema().await?;
        let (enums, lookup_warnings) = self.lookup_enums(&graph, suffixes).await?;
        warnings.extend(lookup_warnings);

        tracing::info!(
            tables = graph.table_count(),
            edges = graph.edges().len(),
            enums = enums.len(),
            "schema inspected"
        );
        Ok(Inspection {
            graph,
            enums,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_sql_quotes_reserved_names() {
        assert_eq!(
            lookup_rows_sql("order_status"),
            "select row_to_json(t) from order_status t order by id"
        );
        assert_eq!(
            lookup_rows_sql("user"),
            "select row_to_json(t) from \"user\" t order by id"
        );
    }

    #[test]
    fn test_catalog_queries_stay_in_public() {
        for sql in [TABLES_SQL, COLUMNS_SQL] {
            assert!(sql.contains("'public'"));
        }
        assert!(FOREIGN_KEYS_SQL.contains("'public'::regnamespace"));
        assert!(FOREIGN_KEYS_SQL.contains("contype = 'f'"));
        assert!(COLUMNS_SQL.contains("order by table_name, ordinal_position"));
    }

    #[test]
    fn test_query_errors_name_the_statement() {
        let err = query_error(COLUMNS_SQL)(sqlx::Error::RowNotFound);
        assert!(err.is_introspection());
        assert!(err.to_string().contains("select table_name::text,"));
    }

    #[test]
    fn test_rows_feed_the_schema_graph() {
        let snapshot = CatalogSnapshot {
            tables: vec!["account".into(), "user".into()],
            columns: vec![
                column_from_row(("account".into(), "id".into(), "bigint".into(), None, false)),
                column_from_row((
                    "account".into(),
                    "uuid".into(),
                    "uuid".into(),
                    Some("gen_random_uuid()".into()),
                    false,
                )),
                column_from_row(("account".into(), "user_id".into(), "bigint".into(), None, true)),
                column_from_row(("user".into(), "id".into(), "bigint".into(), None, false)),
                column_from_row(("user".into(), "bearer_token".into(), "text".into(), None, true)),
            ],
            constraints: vec![constraint_from_row((
                "account".into(),
                "account_user_id_fkey".into(),
                "FOREIGN KEY (user_id) REFERENCES \"user\"(id)".into(),
            ))],
        };

        let build = SchemaGraph::from_snapshot(snapshot).unwrap();
        assert_eq!(build.graph.table_count(), 2);
        let edge = &build.graph.edges()[0];
        assert_eq!(edge.from_table, "account");
        assert_eq!(edge.to_table, "user");
        assert_eq!(edge.to_column, "id");
    }
}
