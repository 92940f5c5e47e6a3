//! # Catalyst Introspect
//!
//! Reads the `public` schema of a PostgreSQL database and drives a full
//! generation run:
//!
//! - [`pool`] - connection pool from [`DatabaseConfig`](catalyst_core::DatabaseConfig)
//! - [`catalog`] - bulk catalog queries into a [`SchemaGraph`](catalyst_ir::SchemaGraph)
//!   and lookup tables into [`EnumTable`](catalyst_ir::EnumTable)s
//! - [`build`] - inspect, generate and write in one call

pub mod build;
pub mod catalog;
pub mod pool;

pub use build::{BuildOutcome, run_build};
pub use catalog::{Inspection, SchemaInspector};
pub use pool::{connect, connect_options};
