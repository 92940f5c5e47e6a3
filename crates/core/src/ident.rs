//! SQL identifier quoting.
//!
//! Catalog names are emitted verbatim into generated SQL unless they collide
//! with a PostgreSQL reserved word or need quoting to survive case folding.

/// PostgreSQL reserved key words (SQL:2016 "reserved" column of the PostgreSQL docs).
const RESERVED_WORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

/// Returns true if `name` is a PostgreSQL reserved word.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.binary_search(&name).is_ok()
}

/// Quote an identifier for use in SQL when required.
///
/// Plain lowercase identifiers pass through unchanged; reserved words and
/// names containing characters outside `[a-z0-9_]` (or starting with a digit)
/// are double-quoted with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        None => return true,
        Some(c) if !(c.is_ascii_lowercase() || c == '_') => return true,
        _ => {}
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return true;
    }
    is_reserved_word(name)
}

/// Strip surrounding double quotes from a catalog-rendered identifier.
///
/// `pg_get_constraintdef` and `regclass::text` quote names the same way
/// [`quote_ident`] does; this reverses it.
pub fn unquote_ident(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reserved_list_is_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS.to_vec());
    }

    #[test]
    fn test_quotes_reserved_words() {
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("group"), "\"group\"");
    }

    #[test]
    fn test_leaves_plain_names_alone() {
        assert_eq!(quote_ident("invoice"), "invoice");
        assert_eq!(quote_ident("account_id"), "account_id");
        assert_eq!(quote_ident("_hidden2"), "_hidden2");
    }

    #[test]
    fn test_quotes_mixed_case_and_symbols() {
        assert_eq!(quote_ident("LineItem"), "\"LineItem\"");
        assert_eq!(quote_ident("2fa"), "\"2fa\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_unquote_reverses_quote() {
        for name in ["user", "LineItem", "odd\"name", "invoice"] {
            assert_eq!(unquote_ident(&quote_ident(name)), name);
        }
    }
}
