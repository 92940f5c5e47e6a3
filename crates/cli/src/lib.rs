//! # Catalyst CLI
//!
//! Command-line front end for the generator.
//!
//! ## Commands
//!
//! - `build` - introspect the database (or a snapshot) and write the API
//! - `inspect` - print tables, identity modes and foreign keys
//! - `join-path` - print the join chain between two tables
//! - `routes` - print the routes an OpenAPI document binds
//!
//! Flags fall back to the same environment variables the server reads.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catalyst_codegen::{GeneratedProject, Generator, GeneratorConfig, JoinPath, resolve, summarize};
use catalyst_core::config::load_dotenv;
use catalyst_core::{DatabaseConfig, GeneratorSettings};
use catalyst_introspect::{SchemaInspector, connect, run_build};
use catalyst_ir::{CatalogSnapshot, SchemaGraph};
use catalyst_runtime::{RouteBinding, route_bindings};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "catalyst", version, about = "Generate a REST API from a PostgreSQL schema")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Introspect the schema and write the generated API
    Build(BuildArgs),

    /// Print tables, identity modes and foreign keys
    Inspect {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the raw catalog snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the join path from one table to another
    JoinPath {
        origin: String,
        destination: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Print the routes an OpenAPI document binds
    Routes {
        /// Path to the generated openapi.3.0.0.json
        document: PathBuf,
    },
}

/// Where the schema comes from
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Read a catalog snapshot (`inspect --json`) instead of the database
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Log every catalog statement
    #[arg(long)]
    pub debug_sql: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output directory
    #[arg(short, long, env = "CATALYST_OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// Mount prefix of the generated API
    #[arg(long, env = "CATALYST_API_PREFIX")]
    pub prefix: Option<String>,

    /// Table every listed row must be reachable from
    #[arg(long, env = "CATALYST_RESTRICTION_TABLE")]
    pub restriction_table: Option<String>,

    /// Bearer-token column of the restriction table
    #[arg(long, env = "CATALYST_TOKEN_COLUMN")]
    pub token_column: Option<String>,
}

impl BuildArgs {
    /// Environment settings with the flags applied on top.
    pub fn settings(&self, mut settings: GeneratorSettings) -> GeneratorSettings {
        if let Some(output) = &self.output {
            settings.output_dir = output.clone();
        }
        if let Some(prefix) = &self.prefix {
            settings.api_prefix = prefix.clone();
        }
        if let Some(table) = &self.restriction_table {
            settings.restriction_table = table.clone();
        }
        if let Some(column) = &self.token_column {
            settings.token_column = column.clone();
        }
        settings
    }
}

// ============================================================================
// Commands
// ============================================================================

pub async fn run(cli: Cli) -> Result<()> {
    load_dotenv();
    match cli.command {
        Command::Build(args) => build(&args).await,
        Command::Inspect { source, json } => {
            let snapshot = load_snapshot(&source).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let build = SchemaGraph::from_snapshot(snapshot)?;
                print!("{}", render_schema(&build.graph));
                print_warnings(&build.warnings);
            }
            Ok(())
        }
        Command::JoinPath {
            origin,
            destination,
            source,
        } => {
            let build = SchemaGraph::from_snapshot(load_snapshot(&source).await?)?;
            let path = resolve(&build.graph, &origin, &destination);
            print!("{}", render_join_path(&origin, &destination, path.as_ref()));
            Ok(())
        }
        Command::Routes { document } => {
            let bindings = read_bindings(&document)?;
            println!("{}", format!("{} routes", bindings.len()).bold());
            print!("{}", render_routes(&bindings));
            Ok(())
        }
    }
}

async fn build(args: &BuildArgs) -> Result<()> {
    let settings = args.settings(GeneratorSettings::from_env());

    let project: GeneratedProject = match &args.source.snapshot {
        Some(path) => {
            let build = SchemaGraph::from_snapshot(read_snapshot(path)?)?;
            let generator = Generator::new(GeneratorConfig::from(&settings));
            let mut project = generator.generate_and_write(&build.graph, &[])?;
            let mut warnings = build.warnings;
            warnings.append(&mut project.warnings);
            project.warnings = warnings;
            project
        }
        None => {
            let db = DatabaseConfig::from_env();
            let pool = connect(&db).await?;
            run_build(&pool, &settings, args.source.debug_sql || db.debug)
                .await?
                .project
        }
    };

    print!("{}", summarize(&project).display());
    print_warnings(&project.warnings);
    println!(
        "{} {}",
        "Output written to".green(),
        settings.output_dir.display()
    );
    Ok(())
}

async fn load_snapshot(source: &SourceArgs) -> Result<CatalogSnapshot> {
    match &source.snapshot {
        Some(path) => read_snapshot(path),
        None => {
            let db = DatabaseConfig::from_env();
            let pool = connect(&db).await?;
            let snapshot = SchemaInspector::new(&pool, source.debug_sql || db.debug)
                .snapshot()
                .await?;
            Ok(snapshot)
        }
    }
}

pub fn read_snapshot(path: &Path) -> Result<CatalogSnapshot> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid snapshot {}", path.display()))
}

pub fn read_bindings(path: &Path) -> Result<Vec<RouteBinding>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not JSON", path.display()))?;
    Ok(route_bindings(&document)?)
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {warning}", "warning:".yellow().bold());
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// One line per table, then one per foreign key
pub fn render_schema(graph: &SchemaGraph) -> String {
    let width = graph
        .tables()
        .iter()
        .map(|t| t.name.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for table in graph.tables() {
        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let _ = writeln!(
            out,
            "{:<width$}  {:<4}  {}",
            table.name,
            table.identity_mode.display_name(),
            columns.join(", ")
        );
    }
    if !graph.edges().is_empty() {
        out.push('\n');
        for edge in graph.edges() {
            let _ = writeln!(out, "{edge}");
        }
    }
    out
}

pub fn render_join_path(origin: &str, destination: &str, path: Option<&JoinPath>) -> String {
    match path {
        None => format!("no join path from {origin} to {destination}\n"),
        Some(path) if path.is_empty() => format!("{origin} is {destination}; no join needed\n"),
        Some(path) => {
            let mut out = format!("{origin} -> {}\n", path.table_chain.join(" -> "));
            for clause in &path.join_clauses {
                let _ = writeln!(out, "  {clause}");
            }
            out
        }
    }
}

pub fn render_routes(bindings: &[RouteBinding]) -> String {
    let width = bindings
        .iter()
        .map(|b| b.router_path.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for binding in bindings {
        let _ = writeln!(
            out,
            "{:<7} {:<width$}  {}::{}",
            binding.method.to_uppercase(),
            binding.router_path,
            binding.table,
            binding.handler
        );
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use catalyst_ir::{ColumnDescriptor, ForeignKeyEdge, TableDescriptor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn graph() -> SchemaGraph {
        SchemaGraph::new(
            vec![
                TableDescriptor::new(
                    "user",
                    vec![ColumnDescriptor::bigint("id"), ColumnDescriptor::text("bearer_token")],
                ),
                TableDescriptor::new(
                    "account",
                    vec![
                        ColumnDescriptor::bigint("id"),
                        ColumnDescriptor::uuid("uuid").with_default("gen_random_uuid()"),
                        ColumnDescriptor::bigint("user_id"),
                    ],
                ),
            ],
            vec![ForeignKeyEdge {
                from_table: "account".into(),
                from_column: "user_id".into(),
                to_table: "user".into(),
                to_column: "id".into(),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["catalyst", "join-path", "invoice", "user", "--snapshot", "s.json"])
            .unwrap();
        match cli.command {
            Command::JoinPath {
                origin,
                destination,
                source,
            } => {
                assert_eq!(origin, "invoice");
                assert_eq!(destination, "user");
                assert_eq!(source.snapshot, Some(PathBuf::from("s.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["catalyst", "routes"]).is_err());
    }

    #[test]
    fn test_build_flags_override_settings() {
        let args = BuildArgs {
            output: Some(PathBuf::from("out")),
            restriction_table: Some("member".into()),
            ..BuildArgs::default()
        };
        let settings = args.settings(GeneratorSettings::from_lookup(|_| None));
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.restriction_table, "member");
        assert_eq!(settings.api_prefix, "/api/v1");
    }

    #[test]
    fn test_render_schema() {
        let text = render_schema(&graph());
        assert_eq!(
            text,
            "account  UUID  id, uuid, user_id\nuser     ID    id, bearer_token\n\naccount.user_id -> user.id\n"
        );
    }

    #[test]
    fn test_render_join_path() {
        let graph = graph();
        let path = resolve(&graph, "account", "user");
        assert_eq!(
            render_join_path("account", "user", path.as_ref()),
            "account -> user\n  JOIN \"user\" ON \"user\".id = account.user_id\n"
        );
        assert_eq!(
            render_join_path("account", "nowhere", None),
            "no join path from account to nowhere\n"
        );
    }

    #[test]
    fn test_render_routes() {
        let document = json!({
            "servers": [{ "url": "/api/v1" }],
            "paths": {
                "/account/": { "get": { "operationId": "account/get_all" } },
                "/account/{uuid}": { "put": { "operationId": "account/update_by_uuid" } }
            }
        });
        let bindings = route_bindings(&document).unwrap();
        assert_eq!(
            render_routes(&bindings),
            "GET     /api/v1/account/        account::get_all\nPUT     /api/v1/account/{uuid}  account::update_by_uuid\n"
        );
    }
}
