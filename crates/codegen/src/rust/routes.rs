//! # Routes Generator
//!
//! Generates `api/routes.rs`, the entry point the runtime process calls at
//! start-up. The router itself is not generated: it is built by the route
//! binder from the OpenAPI document on disk, so routes always match the
//! document that was written next to the handlers.
//!
//! ```text
//! load_document(openapi.3.0.0.json)
//!   → bind_routes(doc, controllers(), PgTokenStore)
//!   → .with_state(pool)
//! ```

use crate::GeneratedFile;
use crate::context::GenerationContext;
use crate::openapi::OPENAPI_FILE;
use crate::rust::{API_DIR, doc_comment, file_header, raw_string};

/// Generate `api/routes.rs`.
pub fn generate_routes(ctx: &GenerationContext<'_>) -> GeneratedFile {
    let mut content = String::with_capacity(1024);
    content.push_str(&file_header("Router construction from the generated OpenAPI document."));

    content.push_str("use std::path::Path;\n\n");
    content.push_str("use axum::Router;\n");
    content.push_str("use catalyst_runtime::{BindError, PgTokenStore, bind_routes, load_document};\n");
    content.push_str("use sqlx::PgPool;\n\n");

    content.push_str(&format!(
        "/// File name of the OpenAPI document written next to this module\npub const DOCUMENT_FILE: &str = {:?};\n\n",
        OPENAPI_FILE
    ));
    content.push_str(&format!(
        "/// Existence check for bearer tokens (`{}.{}`)\npub const TOKEN_QUERY: &str = {};\n\n",
        ctx.config.restriction_table,
        ctx.config.token_column,
        raw_string(&ctx.token_query())
    ));

    content.push_str(&doc_comment(
        Some(
            "Build the API router from the OpenAPI document at `document`.\n\nEvery route requires a bearer token found in the restriction table.",
        ),
        ctx,
    ));
    content.push_str(
        r#"pub async fn router(document: impl AsRef<Path>, pool: PgPool) -> Result<Router, BindError> {
    let document = load_document(document).await?;
    let tokens = PgTokenStore::new(pool.clone(), TOKEN_QUERY);
    let router = bind_routes(&document, super::controllers(), tokens)?;
    Ok(router.with_state(pool))
}
"#,
    );

    GeneratedFile::rust(format!("{API_DIR}/routes.rs"), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorConfig;
    use catalyst_ir::SchemaGraph;

    #[test]
    fn test_routes_module() {
        let graph = SchemaGraph::default();
        let ctx = GenerationContext::new(&graph, GeneratorConfig::default());
        let file = generate_routes(&ctx);
        assert_eq!(file.path.to_string_lossy(), "api/routes.rs");
        assert!(file.content.contains("pub const DOCUMENT_FILE: &str = \"openapi.3.0.0.json\";"));
        assert!(file.content.contains(
            "pub const TOKEN_QUERY: &str = r#\"select bearer_token from \"user\" where \"user\".bearer_token = $1\"#;"
        ));
        assert!(file.content.contains("bind_routes(&document, super::controllers(), tokens)?"));
    }
}
