//! # Catalyst Core
//!
//! Core types, traits, configuration and error handling for Catalyst.
//!
//! This crate provides the foundational building blocks shared by the
//! introspection, IR and code generation crates:
//!
//! - **Types**: PostgreSQL data types, identity modes, HTTP methods
//! - **Identifiers**: SQL identifier quoting for reserved words
//! - **Config**: environment-driven database, server and generator settings
//! - **Errors**: unified error handling with `EngineError` and `EngineResult`
//!

pub mod config;
pub mod error;
pub mod ident;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{DatabaseConfig, GeneratorSettings, ServerConfig};
pub use error::{EngineError, EngineResult};
pub use ident::{is_reserved_word, quote_ident};
pub use traits::Validatable;
pub use types::{HttpMethod, IdentityMode, ParamLocation, PgDataType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
