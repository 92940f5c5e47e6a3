//! # Catalyst Codegen
//!
//! Turns an introspected [`SchemaGraph`](catalyst_ir::SchemaGraph) into a REST
//! API: endpoint definitions, an OpenAPI 3.0 document and the Rust handler
//! sources that serve it.
//!
//! ## Features
//!
//! - **Join Resolution**: foreign-key paths from any table to the restriction table
//! - **Endpoint Synthesis**: list / get / children / insert / update per table
//! - **OpenAPI Assembly**: one document with paths, schemas, tags and security
//! - **Handler Generation**: axum + sqlx handler modules and a handler registry
//! - **Enum Generation**: lookup tables as Rust enums
//!

// ============================================================================
// Modules
// ============================================================================

pub mod context;
pub mod endpoint;
pub mod generator;
pub mod join_path;
pub mod openapi;
pub mod rust;
pub mod sql;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::{GenerationContext, TableInfo};
pub use endpoint::{
    EndpointDefinition, EndpointKind, ParamSpec, ResponseShape, SqlParam, Synthesized,
    synthesize_table,
};
pub use generator::{GenerationSummary, Generator, summarize};
pub use join_path::{JoinPath, resolve};
pub use openapi::{OPENAPI_FILE, OpenApiBuilder};

use catalyst_core::{EngineError, EngineResult, GeneratorSettings, Validatable};
use std::path::{Path, PathBuf};

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Configuration for the code generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Output directory for generated artifacts
    pub output_dir: PathBuf,

    /// Mount prefix written to `servers[0].url`
    pub api_prefix: String,

    /// Table every listed row must be reachable from
    pub restriction_table: String,

    /// Bearer-token column of the restriction table
    pub token_column: String,

    /// Table-name suffixes that mark lookup tables
    pub lookup_suffixes: Vec<String>,

    /// `info.title` is derived from this
    pub api_name: String,

    /// `info.version`
    pub api_version: String,

    /// Whether to emit doc comments on generated handlers
    pub generate_docs: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./generated"),
            api_prefix: "/api/v1".to_string(),
            restriction_table: "user".to_string(),
            token_column: "bearer_token".to_string(),
            lookup_suffixes: vec!["_status".to_string()],
            api_name: "catalyst".to_string(),
            api_version: "1.0.0".to_string(),
            generate_docs: true,
        }
    }
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the mount prefix
    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Set the restriction table
    pub fn with_restriction_table(mut self, table: impl Into<String>) -> Self {
        self.restriction_table = table.into();
        self
    }

    /// Set the bearer-token column
    pub fn with_token_column(mut self, column: impl Into<String>) -> Self {
        self.token_column = column.into();
        self
    }

    /// Replace the lookup-table suffixes
    pub fn with_lookup_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lookup_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the document title source and version
    pub fn with_api_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.api_name = name.into();
        self.api_version = version.into();
        self
    }

    /// Disable documentation comments
    pub fn without_docs(mut self) -> Self {
        self.generate_docs = false;
        self
    }
}

impl From<&GeneratorSettings> for GeneratorConfig {
    fn from(settings: &GeneratorSettings) -> Self {
        Self {
            output_dir: settings.output_dir.clone(),
            api_prefix: settings.api_prefix.clone(),
            restriction_table: settings.restriction_table.clone(),
            token_column: settings.token_column.clone(),
            lookup_suffixes: settings.lookup_suffixes.clone(),
            api_name: settings.api_name.clone(),
            api_version: settings.api_version.clone(),
            generate_docs: true,
        }
    }
}

impl Validatable for GeneratorConfig {
    fn validate(&self) -> EngineResult<()> {
        if !self.api_prefix.starts_with('/') {
            return Err(EngineError::InvalidConfig(format!(
                "API prefix '{}' must start with '/'",
                self.api_prefix
            )));
        }
        if self.restriction_table.is_empty() {
            return Err(EngineError::MissingConfig("restriction table".to_string()));
        }
        if self.token_column.is_empty() {
            return Err(EngineError::MissingConfig("token column".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// GeneratedFile
// ============================================================================

/// Represents a single generated file
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Relative path from output directory
    pub path: PathBuf,

    /// File content
    pub content: String,

    /// File type for categorization
    pub file_type: FileType,
}

impl GeneratedFile {
    /// Create a new generated file
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            file_type,
        }
    }

    /// Create a Rust source file
    pub fn rust(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Rust)
    }

    /// Create a JSON document
    pub fn json(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self::new(path, content, FileType::Json)
    }

    /// Get the file extension
    pub fn extension(&self) -> &str {
        self.file_type.extension()
    }
}

/// Type of generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Rust,
    Json,
}

impl FileType {
    /// Get the file extension for this type
    pub fn extension(&self) -> &str {
        match self {
            FileType::Rust => "rs",
            FileType::Json => "json",
        }
    }
}

// ============================================================================
// GeneratedProject
// ============================================================================

/// Collection of all artifacts produced by one generation run
#[derive(Debug, Clone)]
pub struct GeneratedProject {
    /// API name
    pub name: String,

    /// All generated files, in a deterministic order
    pub files: Vec<GeneratedFile>,

    /// Warnings raised during introspection and generation
    pub warnings: Vec<String>,

    /// Number of tables processed
    pub table_count: usize,

    /// Number of endpoints synthesized
    pub endpoint_count: usize,

    /// Number of lookup enums emitted
    pub enum_count: usize,
}

impl GeneratedProject {
    /// Create a new generated project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            warnings: Vec::new(),
            table_count: 0,
            endpoint_count: 0,
            enum_count: 0,
        }
    }

    /// Add a file to the project
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Get the number of files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get files by type
    pub fn files_by_type(&self, file_type: FileType) -> Vec<&GeneratedFile> {
        self.files
            .iter()
            .filter(|f| f.file_type == file_type)
            .collect()
    }

    /// Find a file by its relative path
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&GeneratedFile> {
        let path = path.as_ref();
        self.files.iter().find(|f| f.path == path)
    }

    /// Write all files to `base_dir`, replacing its previous contents.
    ///
    /// Files are first written to a sibling staging directory which is then
    /// renamed over `base_dir`. A failure before the swap leaves the previous
    /// output untouched. Output moved aside by a run that died mid-swap is
    /// restored before anything else happens.
    pub fn write_to_disk(&self, base_dir: impl AsRef<Path>) -> EngineResult<()> {
        let target = base_dir.as_ref();
        let dir_name = target
            .file_name()
            .ok_or_else(|| EngineError::InvalidOutputPath(target.to_path_buf()))?
            .to_string_lossy()
            .to_string();
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| EngineError::DirectoryCreate {
            path: parent.clone(),
            message: e.to_string(),
        })?;

        recover_interrupted_swap(&parent, &dir_name, target)?;

        let pid = std::process::id();
        let staging = parent.join(format!(".{dir_name}.staging-{pid}"));
        let backup = parent.join(format!(".{dir_name}.previous-{pid}"));

        if staging.exists() {
            remove_dir(&staging)?;
        }
        if let Err(e) = self.write_files(&staging) {
            let _ = std::fs::remove_dir_all(&staging);
            return Err(e);
        }

        if target.exists() {
            if backup.exists() {
                remove_dir(&backup)?;
            }
            std::fs::rename(target, &backup).map_err(|e| EngineError::FileWrite {
                path: target.to_path_buf(),
                message: format!("could not move previous output aside: {e}"),
            })?;
            if let Err(e) = std::fs::rename(&staging, target) {
                let _ = std::fs::rename(&backup, target);
                let _ = std::fs::remove_dir_all(&staging);
                return Err(EngineError::FileWrite {
                    path: target.to_path_buf(),
                    message: e.to_string(),
                });
            }
            remove_dir(&backup)?;
        } else {
            std::fs::rename(&staging, target).map_err(|e| EngineError::FileWrite {
                path: target.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        Ok(())
    }

    fn write_files(&self, dir: &Path) -> EngineResult<()> {
        for file in &self.files {
            let full_path = dir.join(&file.path);

            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| EngineError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    message: e.to_string(),
                })?;
            }

            std::fs::write(&full_path, &file.content).map_err(|e| EngineError::FileWrite {
                path: full_path.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Siblings of the output left behind by earlier runs: `(backups, staging)`
fn swap_leftovers(parent: &Path, dir_name: &str) -> EngineResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let backup_prefix = format!(".{dir_name}.previous-");
    let staging_prefix = format!(".{dir_name}.staging-");
    let mut backups = Vec::new();
    let mut staging = Vec::new();
    for entry in std::fs::read_dir(parent)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&backup_prefix) {
            backups.push(entry.path());
        } else if name.starts_with(&staging_prefix) {
            staging.push(entry.path());
        }
    }
    backups.sort();
    staging.sort();
    Ok((backups, staging))
}

/// Put back output moved aside by a run that stopped between its two renames.
///
/// With the target missing, the most recently modified backup is restored;
/// every other leftover is removed.
fn recover_interrupted_swap(parent: &Path, dir_name: &str, target: &Path) -> EngineResult<()> {
    let (mut backups, staging) = swap_leftovers(parent, dir_name)?;
    for dir in &staging {
        remove_dir(dir)?;
    }
    if !target.exists() {
        backups.sort_by_key(|path| std::fs::metadata(path).and_then(|m| m.modified()).ok());
        if let Some(latest) = backups.pop() {
            tracing::warn!(
                backup = %latest.display(),
                target = %target.display(),
                "restoring output from an interrupted write"
            );
            std::fs::rename(&latest, target).map_err(|e| EngineError::FileWrite {
                path: target.to_path_buf(),
                message: format!("could not restore previous output: {e}"),
            })?;
        }
    }
    for dir in &backups {
        remove_dir(dir)?;
    }
    Ok(())
}

fn remove_dir(path: &Path) -> EngineResult<()> {
    std::fs::remove_dir_all(path).map_err(|e| EngineError::FileWrite {
        path: path.to_path_buf(),
        message: format!("could not remove directory: {e}"),
    })
}

// ============================================================================
// Tests
// ============================================================================
