//! # Rust Source Generation
//!
//! Renders endpoint definitions into the Rust sources of the `api` module
//! that the runtime crate compiles in:
//!
//! - `api/mod.rs`: module list and the handler registry
//! - `api/{table}.rs`: handler + data-access function per endpoint
//! - `api/enums.rs`: one enum per lookup table
//! - `api/routes.rs`: router built from the OpenAPI document
//!
//! Every file starts with the same generated-code header.

pub mod enums;
pub mod handlers;
pub mod registry;
pub mod routes;

use crate::GenerationContext;

/// Module directory all generated sources live in
pub const API_DIR: &str = "api";

/// Header written at the top of every generated Rust file
pub fn file_header(description: &str) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("// Auto-generated by Catalyst. DO NOT EDIT.\n");
    out.push_str("// Regenerate with `catalyst build` or GET /api/generator/build.\n");
    out.push_str("//\n");
    for line in description.lines() {
        if line.is_empty() {
            out.push_str("//\n");
        } else {
            out.push_str("// ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push('\n');
    out
}

/// `///` doc lines for `text`, or nothing when docs are disabled
pub fn doc_comment(text: Option<&str>, ctx: &GenerationContext<'_>) -> String {
    let Some(text) = text.filter(|_| ctx.config.generate_docs) else {
        return String::new();
    };
    let mut out = String::new();
    for line in text.lines() {
        if line.is_empty() {
            out.push_str("///\n");
        } else {
            out.push_str("/// ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// A raw string literal holding `text` verbatim, with enough `#`s that
/// no quote inside can close it.
pub fn raw_string(text: &str) -> String {
    let mut hashes = 1;
    while text.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use catalyst_ir::SchemaGraph;

    #[test]
    fn test_file_header() {
        let header = file_header("Handlers for `invoice`.");
        assert!(header.contains("Auto-generated by Catalyst"));
        assert!(header.contains("DO NOT EDIT"));
        assert!(header.contains("// Handlers for `invoice`."));
        assert!(header.ends_with("\n\n"));
    }

    #[test]
    fn test_doc_comment_respects_config() {
        let graph = SchemaGraph::default();
        let ctx = GenerationContext::new(&graph, GeneratorConfig::default());
        assert_eq!(doc_comment(Some("Get all\n\nGET /x/"), &ctx), "/// Get all\n///\n/// GET /x/\n");

        let quiet = GenerationContext::new(&graph, GeneratorConfig::default().without_docs());
        assert_eq!(doc_comment(Some("Get all"), &quiet), "");
    }

    #[test]
    fn test_raw_string_fences_quotes() {
        assert_eq!(raw_string("select 1"), "r#\"select 1\"#");
        assert_eq!(
            raw_string("select \"user\".id"),
            "r#\"select \"user\".id\"#"
        );
        assert_eq!(raw_string("a \"# b"), "r##\"a \"# b\"##");
    }
}
