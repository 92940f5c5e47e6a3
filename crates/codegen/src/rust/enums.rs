//! # Enum Generator
//!
//! Renders lookup tables as `#[repr(i64)]` Rust enums whose discriminants
//! are the row ids, plus a `key -> id` table per enum.

use std::collections::HashSet;

use catalyst_ir::EnumTable;

use crate::GeneratedFile;
use crate::context::GenerationContext;
use crate::rust::{API_DIR, doc_comment, file_header};

/// Generate `api/enums.rs` for the given lookup tables.
pub fn generate_enums(ctx: &GenerationContext<'_>, tables: &[&EnumTable]) -> GeneratedFile {
    let mut content = String::with_capacity(2048);
    content.push_str(&file_header("Lookup tables as enums (`key -> id`)."));

    for (index, table) in tables.iter().enumerate() {
        if index > 0 {
            content.push('\n');
        }
        content.push_str(&render_enum(ctx, table));
    }

    GeneratedFile::rust(format!("{API_DIR}/enums.rs"), content)
}

/// Variant names for every key, in row order, made unique
fn variant_names(table: &EnumTable) -> Vec<String> {
    let mut used = HashSet::new();
    table
        .mapping
        .iter()
        .map(|(key, id)| {
            let base = GenerationContext::type_ident(key);
            let mut name = base.clone();
            let mut attempt = 1;
            while used.contains(&name) {
                name = match attempt {
                    1 => format!("{base}{id}"),
                    n => format!("{base}{id}V{n}"),
                };
                attempt += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

fn render_enum(ctx: &GenerationContext<'_>, table: &EnumTable) -> String {
    let name = GenerationContext::type_ident(&table.table_name);
    let variants = variant_names(table);
    let rows: Vec<(&String, &i64, &String)> = table
        .mapping
        .iter()
        .zip(variants.iter())
        .map(|((key, id), variant)| (key, id, variant))
        .collect();

    let mut out = String::with_capacity(1024);
    out.push_str(&doc_comment(
        Some(&format!(
            "Rows of `{}`, keyed by `{}`",
            table.table_name, table.key_column
        )),
        ctx,
    ));
    out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\n");
    out.push_str("#[repr(i64)]\n");
    out.push_str(&format!("pub enum {name} {{\n"));
    for (_, id, variant) in &rows {
        out.push_str(&format!("    {variant} = {id},\n"));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("impl {name} {{\n"));
    out.push_str(&format!(
        "    pub const ALL: &'static [{name}] = &[{}];\n\n",
        rows.iter()
            .map(|(_, _, v)| format!("{name}::{v}"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out.push_str("    pub const fn id(self) -> i64 {\n        self as i64\n    }\n\n");

    out.push_str("    pub const fn key(self) -> &'static str {\n        match self {\n");
    for (key, _, variant) in &rows {
        out.push_str(&format!("            {name}::{variant} => {key:?},\n"));
    }
    out.push_str("        }\n    }\n\n");

    out.push_str("    pub fn from_key(key: &str) -> Option<Self> {\n        match key {\n");
    for (key, _, variant) in &rows {
        out.push_str(&format!("            {key:?} => Some({name}::{variant}),\n"));
    }
    out.push_str("            _ => None,\n        }\n    }\n\n");

    out.push_str("    pub const fn from_id(id: i64) -> Option<Self> {\n        match id {\n");
    for (_, id, variant) in &rows {
        out.push_str(&format!("            {id} => Some({name}::{variant}),\n"));
    }
    out.push_str("            _ => None,\n        }\n    }\n}\n\n");

    out.push_str(&format!(
        "/// `{}` as `(key, id)` pairs\npub const {}: &[(&str, i64)] = &[{}];\n",
        table.table_name,
        GenerationContext::snake(&table.table_name).to_uppercase(),
        rows.iter()
            .map(|(key, id, _)| format!("({key:?}, {id})"))
            .collect::<Vec<_>>()
            .join(", ")
    ));
    out
}
