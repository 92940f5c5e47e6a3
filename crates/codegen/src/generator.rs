//! # Code Generator Orchestrator
//!
//! The `Generator` is the top-level entry point for code generation. It takes
//! an introspected [`SchemaGraph`], the lookup [`EnumTable`]s and a
//! [`GeneratorConfig`], and produces a complete [`GeneratedProject`].
//!
//! ## Pipeline
//!
//! ```text
//! SchemaGraph + EnumTables + GeneratorConfig
//!         │
//!         ▼
//!   GenerationContext::new()
//!         │
//!         ├──► per table (lexicographic):
//!         │      synthesize_table()      → EndpointDefinitions
//!         │      OpenApiBuilder::attach() for each endpoint
//!         │      rust::handlers          → api/{table}.rs
//!         │
//!         ├──► rust::registry / routes / enums
//!         │
//!         ▼
//!   GeneratedProject { files, warnings }
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalyst_codegen::{Generator, GeneratorConfig};
//!
//! let result = Generator::new(GeneratorConfig::default()).generate(&graph, &enums)?;
//!
//! println!("Generated {} files", result.file_count());
//! result.write_to_disk("/path/to/output")?;
//! ```

use std::collections::HashSet;

use catalyst_core::{EngineError, EngineResult, Validatable};
use catalyst_ir::{EnumTable, SchemaGraph};

use crate::context::{GenerationContext, TableInfo};
use crate::endpoint::{Synthesized, synthesize_table};
use crate::openapi::{OPENAPI_FILE, OpenApiBuilder};
use crate::rust;
use crate::rust::registry::RegisteredModule;
use crate::{FileType, GeneratedFile, GeneratedProject, GeneratorConfig};

// ============================================================================
// Generator
// ============================================================================

/// Top-level code generator that orchestrates the full generation pipeline.
///
/// The `Generator` is stateless aside from its configuration.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    // ====================================================================
    // Generation
    // ====================================================================

    /// Run the full pipeline on a schema graph.
    ///
    /// # Steps
    ///
    /// 1. **Validate** the configuration and the graph.
    /// 2. **Synthesize** endpoints per table and attach them to the document.
    /// 3. **Render** the handler modules, registry, routes and enums.
    /// 4. **Collect warnings** (missing restriction table, unrestricted
    ///    lists, empty lookup tables, ...).
    ///
    /// # Errors
    ///
    /// Invalid configuration or graph, two tables that map to the same Rust
    /// module, or a document that cannot be serialized.
    pub fn generate(&self, graph: &SchemaGraph, enums: &[EnumTable]) -> EngineResult<GeneratedProject> {
        // ── 1. Validate ──────────────────────────────────────────────────
        self.config.validate()?;
        graph.validate()?;

        let ctx = GenerationContext::new(graph, self.config.clone());
        let mut output = GeneratedProject::new(&self.config.api_name);
        output.table_count = graph.table_count();

        if !ctx.has_restriction_table() {
            output.add_warning(format!(
                "restriction table '{}' not found; list endpoints are unrestricted",
                self.config.restriction_table
            ));
        }

        let mut modules = HashSet::new();
        for table in ctx.tables() {
            let module = TableInfo::new(table, &ctx).module_file();
            if !modules.insert(module.clone()) {
                return Err(EngineError::codegen(format!(
                    "table '{}' maps to module '{}' which is already taken",
                    table.name, module
                )));
            }
        }

        // ── 2. Synthesize + assemble ─────────────────────────────────────
        let mut builder = OpenApiBuilder::new(&self.config);
        let synthesized: Vec<Synthesized> = ctx
            .tables()
            .iter()
            .map(|table| synthesize_table(&ctx, table))
            .collect();

        for (table, synth) in ctx.tables().iter().zip(&synthesized) {
            for endpoint in &synth.endpoints {
                builder.attach(table, endpoint);
            }
            for warning in &synth.warnings {
                output.add_warning(warning.clone());
            }
            output.endpoint_count += synth.endpoints.len();
            tracing::debug!(
                table = %table.name,
                identity = table.identity_mode.display_name(),
                endpoints = synth.endpoints.len(),
                "table synthesized",
            );
        }

        // ── 3. Enums ─────────────────────────────────────────────────────
        let lookups: Vec<&EnumTable> = ctx
            .lookup_enums(enums)
            .into_iter()
            .filter(|table| {
                if table.is_empty() {
                    output.add_warning(format!(
                        "lookup table '{}' has no rows; no enum generated",
                        table.table_name
                    ));
                }
                !table.is_empty()
            })
            .collect();
        output.enum_count = lookups.len();

        // ── 4. Render ────────────────────────────────────────────────────
        output.add_file(GeneratedFile::json(OPENAPI_FILE, builder.to_json_pretty()?));

        let registered: Vec<RegisteredModule<'_>> = ctx
            .tables()
            .iter()
            .zip(&synthesized)
            .map(|(table, synth)| RegisteredModule {
                info: TableInfo::new(table, &ctx),
                endpoints: &synth.endpoints,
            })
            .collect();
        output.add_file(rust::registry::generate_registry(&ctx, &registered, !lookups.is_empty()));
        output.add_file(rust::routes::generate_routes(&ctx));
        if !lookups.is_empty() {
            output.add_file(rust::enums::generate_enums(&ctx, &lookups));
        }
        for module in &registered {
            output.add_file(rust::handlers::generate_table_module(&module.info, module.endpoints));
        }

        tracing::info!(
            files = output.file_count(),
            tables = output.table_count,
            endpoints = output.endpoint_count,
            warnings = output.warnings.len(),
            "code generation complete",
        );

        Ok(output)
    }

    /// Generate and write every file to the configured output directory.
    pub fn generate_and_write(&self, graph: &SchemaGraph, enums: &[EnumTable]) -> EngineResult<GeneratedProject> {
        let output = self.generate(graph, enums)?;
        output.write_to_disk(&self.config.output_dir)?;
        tracing::info!(
            output_dir = %self.config.output_dir.display(),
            files = output.file_count(),
            "files written to disk",
        );
        Ok(output)
    }
}

// ============================================================================
// GenerationSummary
// ============================================================================

/// A human-readable summary of a completed generation run.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub api_name: String,
    pub total_files: usize,
    pub rust_files: usize,
    pub json_files: usize,
    pub table_count: usize,
    pub endpoint_count: usize,
    pub enum_count: usize,
    pub warning_count: usize,
    /// Total bytes of generated content
    pub total_bytes: usize,
}

impl GenerationSummary {
    pub fn from_project(project: &GeneratedProject) -> Self {
        Self {
            api_name: project.name.clone(),
            total_files: project.file_count(),
            rust_files: project.files_by_type(FileType::Rust).len(),
            json_files: project.files_by_type(FileType::Json).len(),
            table_count: project.table_count,
            endpoint_count: project.endpoint_count,
            enum_count: project.enum_count,
            warning_count: project.warnings.len(),
            total_bytes: project.files.iter().map(|f| f.content.len()).sum(),
        }
    }

    /// Format the summary as a boxed report.
    pub fn display(&self) -> String {
        let mut out = String::with_capacity(768);

        out.push_str("╔══════════════════════════════════════════════════╗\n");
        out.push_str("║         API Generation Complete                  ║\n");
        out.push_str("╠══════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  API:         {:<35}║\n", self.api_name));
        out.push_str(&format!("║  Tables:      {:<35}║\n", self.table_count));
        out.push_str(&format!("║  Endpoints:   {:<35}║\n", self.endpoint_count));
        out.push_str(&format!("║  Enums:       {:<35}║\n", self.enum_count));
        out.push_str(&format!("║  Total Files: {:<35}║\n", self.total_files));
        out.push_str(&format!("║    Rust:      {:<35}║\n", self.rust_files));
        out.push_str(&format!("║    JSON:      {:<35}║\n", self.json_files));
        out.push_str(&format!("║  Warnings:    {:<35}║\n", self.warning_count));

        let size_str = if self.total_bytes < 1024 {
            format!("{} B", self.total_bytes)
        } else if self.total_bytes < 1024 * 1024 {
            format!("{:.1} KB", self.total_bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", self.total_bytes as f64 / (1024.0 * 1024.0))
        };
        out.push_str(&format!("║  Total Size:  {:<35}║\n", size_str));
        out.push_str("╚══════════════════════════════════════════════════╝\n");

        out
    }
}

impl std::fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Produce a [`GenerationSummary`] from a [`GeneratedProject`].
pub fn summarize(project: &GeneratedProject) -> GenerationSummary {
    GenerationSummary::from_project(project)
}

// ============================================================================
// Tests
// ============================================================================
