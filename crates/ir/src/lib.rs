//! # Catalyst IR (Intermediate Representation)
//!
//! In-memory model of an introspected PostgreSQL `public` schema.
//!
//! ## Core Concepts
//!
//! - **TableDescriptor**: a table, its columns and its identity mode
//! - **ColumnDescriptor**: name, catalog data type and default of a column
//! - **ForeignKeyEdge**: a single-column foreign key between two tables
//! - **SchemaGraph**: all tables plus the FK adjacency used by join resolution
//! - **EnumTable**: a lookup table materialized as `key -> id`
//!
//! The graph is built once per generation run from bulk catalog queries
//! ([`CatalogSnapshot`]) or directly from descriptors in tests.

// Module declarations
pub mod column;
pub mod foreign_key;
pub mod lookup;
pub mod schema;
pub mod table;

// Re-export commonly used types at crate root
pub use column::ColumnDescriptor;
pub use foreign_key::{ForeignKeyEdge, ParsedConstraint, parse_constraint_def};
pub use lookup::{EnumTable, is_lookup_table};
pub use schema::{CatalogColumn, CatalogConstraint, CatalogSnapshot, SchemaBuild, SchemaGraph};
pub use table::{TableDescriptor, classify};

// Re-export core types that are commonly used with IR
pub use catalyst_core::{EngineError, EngineResult, IdentityMode, PgDataType};
