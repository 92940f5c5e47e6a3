//! # Generation Context
//!
//! The `GenerationContext` holds everything the synthesizer and renderers
//! need for one run: the schema graph, the generator configuration and the
//! naming rules shared by SQL, OpenAPI and Rust output.
//!

use catalyst_core::{IdentityMode, quote_ident};
use catalyst_ir::{EnumTable, ForeignKeyEdge, SchemaGraph, TableDescriptor, is_lookup_table};
use heck::{ToPascalCase, ToSnakeCase};

use crate::GeneratorConfig;
use crate::join_path::{self, JoinPath};

/// Rust keywords that cannot be used as bare identifiers.
const RUST_KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

// ============================================================================
// GenerationContext
// ============================================================================

/// Context carrying all information needed for one generation run.
#[derive(Debug, Clone)]
pub struct GenerationContext<'g> {
    /// The introspected schema
    pub graph: &'g SchemaGraph,

    /// Generator configuration (prefix, restriction table, flags, ...)
    pub config: GeneratorConfig,
}

impl<'g> GenerationContext<'g> {
    pub fn new(graph: &'g SchemaGraph, config: GeneratorConfig) -> Self {
        Self { graph, config }
    }

    /// Tables in lexicographic order
    pub fn tables(&self) -> &'g [TableDescriptor] {
        self.graph.tables()
    }

    /// Whether the restriction table exists in this schema
    pub fn has_restriction_table(&self) -> bool {
        self.graph.contains(&self.config.restriction_table)
    }

    pub fn is_lookup_table(&self, name: &str) -> bool {
        is_lookup_table(name, &self.config.lookup_suffixes)
    }

    /// Lookup enums whose table is part of this schema, in table order
    pub fn lookup_enums<'e>(&self, enums: &'e [EnumTable]) -> Vec<&'e EnumTable> {
        let mut found: Vec<&EnumTable> = enums
            .iter()
            .filter(|e| self.graph.contains(&e.table_name))
            .collect();
        found.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        found
    }

    /// `SELECT` used by the generated bearer check
    pub fn token_query(&self) -> String {
        let table = quote_ident(&self.config.restriction_table);
        let column = quote_ident(&self.config.token_column);
        format!("select {column} from {table} where {table}.{column} = $1")
    }

    // ====================================================================
    // Naming helpers
    // ====================================================================

    /// Convert a name to `snake_case` (e.g. "LineItem" → "line_item").
    pub fn snake(name: &str) -> String {
        name.to_snake_case()
    }

    /// Convert a name to `PascalCase` (e.g. "order_status" → "OrderStatus").
    pub fn pascal(name: &str) -> String {
        name.to_pascal_case()
    }

    /// Pluralise a table name for descriptions ("invoice" → "invoices",
    /// "status" → "statuses", "category" → "categories").
    pub fn pluralize(word: &str) -> String {
        if word.ends_with('s')
            || word.ends_with('x')
            || word.ends_with("ch")
            || word.ends_with("sh")
        {
            format!("{}es", word)
        } else if word.ends_with('y')
            && !word.ends_with("ey")
            && !word.ends_with("ay")
            && !word.ends_with("oy")
            && !word.ends_with("uy")
        {
            format!("{}ies", &word[..word.len() - 1])
        } else {
            format!("{}s", word)
        }
    }

    /// A snake_case name made safe for use as a Rust identifier.
    ///
    /// Keywords become raw identifiers; the four that cannot be raw get a
    /// trailing underscore; leading digits get an underscore prefix.
    pub fn rust_ident(name: &str) -> String {
        let mut ident = Self::snake(name);
        if ident.is_empty() {
            ident.push('_');
        }
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, '_');
        }
        match ident.as_str() {
            "self" | "super" | "crate" | "Self" => format!("{ident}_"),
            kw if RUST_KEYWORDS.contains(&kw) => format!("r#{kw}"),
            _ => ident,
        }
    }

    /// A PascalCase type name made safe for Rust.
    pub fn type_ident(name: &str) -> String {
        let mut ident = Self::pascal(name);
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            ident.insert(0, 'V');
        }
        if ident == "Self" {
            ident.push_str("Value");
        }
        ident
    }
}

// ============================================================================
// TableInfo
// ============================================================================

/// Lightweight wrapper for generating code for one table at a time.
#[derive(Debug, Clone)]
pub struct TableInfo<'a> {
    pub table: &'a TableDescriptor,
    pub ctx: &'a GenerationContext<'a>,
}

impl<'a> TableInfo<'a> {
    pub fn new(table: &'a TableDescriptor, ctx: &'a GenerationContext<'a>) -> Self {
        Self { table, ctx }
    }

    /// Catalog name
    pub fn name(&self) -> &'a str {
        &self.table.name
    }

    /// Name as written in SQL (quoted when reserved)
    pub fn sql_name(&self) -> String {
        quote_ident(&self.table.name)
    }

    /// Rust module file stem (`api/{module_file}.rs`), matching `module_ident`
    pub fn module_file(&self) -> String {
        let ident = self.module_ident();
        ident.trim_start_matches("r#").to_string()
    }

    /// Rust module identifier (`pub mod {module_ident};`)
    pub fn module_ident(&self) -> String {
        GenerationContext::rust_ident(&self.table.name)
    }

    /// PascalCase type prefix
    pub fn pascal_name(&self) -> String {
        GenerationContext::type_ident(&self.table.name)
    }

    /// Plural form for descriptions
    pub fn plural_name(&self) -> String {
        GenerationContext::pluralize(&self.table.name)
    }

    pub fn identity_mode(&self) -> IdentityMode {
        self.table.identity_mode
    }

    pub fn is_restriction_table(&self) -> bool {
        self.table.name == self.ctx.config.restriction_table
    }

    /// Join block restricting this table's list to rows reachable from the
    /// restriction table. `None` for the restriction table itself, when the
    /// restriction table is absent, or when no path exists.
    pub fn restriction_join(&self) -> Option<JoinPath> {
        if self.is_restriction_table() || !self.ctx.has_restriction_table() {
            return None;
        }
        join_path::resolve(self.ctx.graph, &self.table.name, &self.ctx.config.restriction_table)
    }

    /// Foreign keys pointing at this table, in catalog order
    pub fn child_edges(&self) -> Vec<&'a ForeignKeyEdge> {
        self.ctx.graph.children(&self.table.name).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
