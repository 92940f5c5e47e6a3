//! # Registry Generator
//!
//! Generates `api/mod.rs`: the module list and the `controllers()` registry
//! the route binder resolves `operationId`s against.

use crate::GeneratedFile;
use crate::context::{GenerationContext, TableInfo};
use crate::endpoint::EndpointDefinition;
use crate::rust::{API_DIR, doc_comment, file_header};

/// One table module and the handlers it exports
pub struct RegisteredModule<'a> {
    pub info: TableInfo<'a>,
    pub endpoints: &'a [EndpointDefinition],
}

/// Generate `api/mod.rs`.
///
/// `modules` must already be in table order; `has_enums` adds the `enums`
/// module.
pub fn generate_registry(
    ctx: &GenerationContext<'_>,
    modules: &[RegisteredModule<'_>],
    has_enums: bool,
) -> GeneratedFile {
    let mut content = String::with_capacity(2048);
    content.push_str(&file_header(
        "Generated API modules and the handler registry.\n\nOperation ids have the form `{table}/{method}`.",
    ));

    for module in modules {
        content.push_str(&format!("pub mod {};\n", module.info.module_ident()));
    }
    if has_enums {
        content.push_str("pub mod enums;\n");
    }
    content.push_str("pub mod routes;\n\n");

    content.push_str("use catalyst_runtime::Controllers;\n");
    content.push_str("use sqlx::PgPool;\n\n");

    content.push_str(&doc_comment(
        Some("Every generated handler, keyed by table and method name."),
        ctx,
    ));
    content.push_str("pub fn controllers() -> Controllers<PgPool> {\n");
    content.push_str("    let mut controllers = Controllers::new();\n");
    for module in modules {
        let ident = module.info.module_ident();
        for endpoint in module.endpoints {
            content.push_str(&format!(
                "    controllers.register({:?}, {:?}, {}::{});\n",
                endpoint.table, endpoint.method_name, ident, endpoint.method_name
            ));
        }
    }
    content.push_str("    controllers\n}\n");

    GeneratedFile::rust(format!("{API_DIR}/mod.rs"), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeneratorConfig, synthesize_table};
    use catalyst_ir::{ColumnDescriptor, SchemaGraph, TableDescriptor};

    #[test]
    fn test_registry_lists_modules_and_handlers() {
        let graph = SchemaGraph::new(
            vec![
                TableDescriptor::new("invoice", vec![ColumnDescriptor::bigint("id")]),
                TableDescriptor::new("type", vec![ColumnDescriptor::text("name")]),
            ],
            vec![],
        )
        .unwrap();
        let ctx = GenerationContext::new(&graph, GeneratorConfig::default());
        let synthesized: Vec<_> = graph
            .tables()
            .iter()
            .map(|t| (t, synthesize_table(&ctx, t).endpoints))
            .collect();
        let modules: Vec<RegisteredModule<'_>> = synthesized
            .iter()
            .map(|(t, endpoints)| RegisteredModule {
                info: TableInfo::new(t, &ctx),
                endpoints,
            })
            .collect();

        let file = generate_registry(&ctx, &modules, false);
        assert_eq!(file.path.to_string_lossy(), "api/mod.rs");
        assert!(file.content.contains("pub mod invoice;\npub mod r#type;\npub mod routes;"));
        assert!(!file.content.contains("pub mod enums;"));
        assert!(file.content.contains("controllers.register(\"invoice\", \"get_by_id\", invoice::get_by_id);"));
        assert!(file.content.contains("controllers.register(\"type\", \"insert\", r#type::insert);"));
    }
}
