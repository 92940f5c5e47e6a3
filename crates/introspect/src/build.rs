//! One generation run: inspect the database, generate, write.

use catalyst_codegen::{GeneratedProject, Generator, GeneratorConfig};
use catalyst_core::{EngineResult, GeneratorSettings, Validatable};
use sqlx::PgPool;

use crate::catalog::{Inspection, SchemaInspector};

/// What a build produced
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Written project; its warnings include the inspection warnings
    pub project: GeneratedProject,
    pub inspection: Inspection,
}

/// Inspect the `public` schema behind `pool` and regenerate the API into
/// `settings.output_dir`.
///
/// Any catalog or write failure aborts the run; the previous output is left
/// in place.
pub async fn run_build(
    pool: &PgPool,
    settings: &GeneratorSettings,
    debug_sql: bool,
) -> EngineResult<BuildOutcome> {
    settings.validate()?;

    // ── Inspect ──────────────────────────────────────────────────
    let inspection = SchemaInspector::new(pool, debug_sql)
        .inspect(&settings.lookup_suffixes)
        .await?;

    // ── Generate + write ─────────────────────────────────────────
    let generator = Generator::new(GeneratorConfig::from(settings));
    let mut project = generator.generate_and_write(&inspection.graph, &inspection.enums)?;

    let mut warnings = inspection.warnings.clone();
    warnings.append(&mut project.warnings);
    project.warnings = warnings;

    for warning in &project.warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        output_dir = %settings.output_dir.display(),
        files = project.file_count(),
        warnings = project.warnings.len(),
        "build complete"
    );

    Ok(BuildOutcome {
        project,
        inspection,
    })
}
