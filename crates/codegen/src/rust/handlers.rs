//! # Handler Generator (Axum + sqlx)
//!
//! Renders one module per table. Every endpoint becomes a pair:
//!
//! | Item                  | Signature |
//! |-----------------------|-----------|
//! | HTTP handler          | `async fn {method}(State<PgPool>, [ApiPath], [ApiQuery<ListParams>], [ApiJson<Body>]) -> Result<Json<…>, ApiError>` |
//! | data-access function  | `async fn {method}_query(&PgPool, …) -> Result<…, sqlx::Error>` |
//!
//! Rows are returned by PostgreSQL as JSON (`row_to_json`), so handlers
//! never need a typed row struct.

use crate::context::{GenerationContext, TableInfo};
use crate::endpoint::{EndpointDefinition, EndpointKind, ParamSpec, SqlParam};
use crate::GeneratedFile;
use crate::rust::{API_DIR, doc_comment, file_header, raw_string};
use crate::sql;

// ============================================================================
// Public API
// ============================================================================

/// Generate `api/{table}.rs` for one table.
pub fn generate_table_module(info: &TableInfo<'_>, endpoints: &[EndpointDefinition]) -> GeneratedFile {
    let path = format!("{}/{}.rs", API_DIR, info.module_file());
    let body = body_struct(info, endpoints);

    let mut content = String::with_capacity(4096);
    content.push_str(&file_header(&format!(
        "Handlers for the `{}` table ({} identity).",
        info.name(),
        info.identity_mode().display_name()
    )));
    content.push_str(&imports(endpoints, body.is_some()));
    content.push('\n');

    for endpoint in endpoints {
        content.push_str(&format!(
            "const {}: &str = {};\n",
            sql_const(endpoint),
            raw_string(&json_statement(endpoint))
        ));
    }

    if let Some(body) = &body {
        content.push('\n');
        content.push_str(&body.render(info.ctx));
    }

    for endpoint in endpoints {
        content.push('\n');
        content.push_str(&render_handler(info, endpoint, body.as_ref()));
        content.push('\n');
        content.push_str(&render_query(endpoint, body.as_ref()));
    }

    GeneratedFile::rust(path, content)
}

// ============================================================================
// Imports
// ============================================================================

fn imports(endpoints: &[EndpointDefinition], has_body: bool) -> String {
    let paginated = endpoints.iter().any(EndpointDefinition::is_paginated);

    // extractors that reject with ApiError
    let mut runtime = vec!["ApiError"];
    if has_body {
        runtime.push("ApiJson");
    }
    if endpoints.iter().any(|e| e.path_param().is_some()) {
        runtime.push("ApiPath");
    }
    if paginated {
        runtime.push("ApiQuery");
        runtime.push("ListParams");
    }

    let mut out = String::new();
    out.push_str("use axum::Json;\n");
    out.push_str("use axum::extract::State;\n");
    out.push_str(&format!("use catalyst_runtime::{{{}}};\n", runtime.join(", ")));
    if has_body {
        out.push_str("use serde::Deserialize;\n");
    }
    out.push_str("use sqlx::PgPool;\n");
    out
}

// ============================================================================
// SQL constants
// ============================================================================

fn sql_const(endpoint: &EndpointDefinition) -> String {
    format!("{}_SQL", endpoint.method_name.to_uppercase())
}

/// The endpoint's statement wrapped so each row is one JSON value
fn json_statement(endpoint: &EndpointDefinition) -> String {
    match endpoint.kind {
        EndpointKind::Insert | EndpointKind::UpdateByUuid => {
            sql::json_returning(&endpoint.sql_template)
        }
        _ => sql::json_rows(&endpoint.sql_template),
    }
}

// ============================================================================
// Body struct
// ============================================================================

struct BodyStruct {
    name: String,
    fields: Vec<BodyField>,
}

struct BodyField {
    column: String,
    ident: String,
    rust_type: String,
}

impl BodyStruct {
    fn render(&self, ctx: &GenerationContext<'_>) -> String {
        let mut out = String::new();
        out.push_str(&doc_comment(Some("Request body shared by insert and update."), ctx));
        out.push_str("#[derive(Debug, Clone, Deserialize)]\n");
        out.push_str(&format!("pub struct {} {{\n", self.name));
        for field in &self.fields {
            if field.ident.trim_start_matches("r#") != field.column {
                out.push_str(&format!("    #[serde(rename = {:?})]\n", field.column));
            }
            out.push_str(&format!("    pub {}: {},\n", field.ident, field.rust_type));
        }
        out.push_str("}\n");
        out
    }
}

fn body_struct(info: &TableInfo<'_>, endpoints: &[EndpointDefinition]) -> Option<BodyStruct> {
    let params: Vec<&ParamSpec> = endpoints
        .iter()
        .find(|e| e.has_body())?
        .body_params()
        .collect();
    if params.is_empty() {
        return None;
    }
    let fields = params
        .iter()
        .map(|p| BodyField {
            column: p.name.clone(),
            ident: GenerationContext::rust_ident(&p.name),
            rust_type: if p.nullable {
                format!("Option<{}>", p.data_type.rust_type())
            } else {
                p.data_type.rust_type().to_string()
            },
        })
        .collect();
    Some(BodyStruct {
        name: format!("{}Body", info.pascal_name()),
        fields,
    })
}

// ============================================================================
// Argument plumbing
// ============================================================================

/// One argument of a data-access function
struct QueryArg {
    /// `name: Type` in the function signature
    decl: String,
    /// Expression passed by the handler
    call: String,
}

fn path_ident(param: &ParamSpec) -> String {
    GenerationContext::rust_ident(&param.name)
}

fn path_type(param: &ParamSpec) -> &'static str {
    param.data_type.rust_type()
}

fn query_args(endpoint: &EndpointDefinition, body: Option<&BodyStruct>) -> Vec<QueryArg> {
    let mut args = Vec::new();
    let mut body_added = false;
    for source in &endpoint.sql_param_order {
        match source {
            SqlParam::Filter => args.push(QueryArg {
                decl: "filter: &str".into(),
                call: "&params.filter_pattern()".into(),
            }),
            SqlParam::Limit => args.push(QueryArg {
                decl: "limit: i64".into(),
                call: "params.limit()".into(),
            }),
            SqlParam::Offset => args.push(QueryArg {
                decl: "offset: i64".into(),
                call: "params.offset()".into(),
            }),
            SqlParam::Path(_) => {
                if let Some(param) = endpoint.path_param() {
                    let ident = path_ident(param);
                    args.push(QueryArg {
                        decl: format!("{ident}: {}", path_type(param)),
                        call: ident,
                    });
                }
            }
            SqlParam::Body(_) => {
                if let (Some(body), false) = (body, body_added) {
                    args.push(QueryArg {
                        decl: format!("body: &{}", body.name),
                        call: "&body".into(),
                    });
                    body_added = true;
                }
            }
        }
    }
    args
}

fn bind_exprs(endpoint: &EndpointDefinition) -> Vec<String> {
    endpoint
        .sql_param_order
        .iter()
        .map(|source| match source {
            SqlParam::Filter => "filter".to_string(),
            SqlParam::Limit => "limit".to_string(),
            SqlParam::Offset => "offset".to_string(),
            SqlParam::Path(_) => endpoint
                .path_param()
                .map(path_ident)
                .unwrap_or_else(|| "key".to_string()),
            SqlParam::Body(column) => {
                format!("&body.{}", GenerationContext::rust_ident(column))
            }
        })
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

enum Fetch {
    All,
    Optional,
    One,
}

fn fetch_mode(endpoint: &EndpointDefinition) -> Fetch {
    match endpoint.kind {
        EndpointKind::List | EndpointKind::ListChildren { .. } => Fetch::All,
        EndpointKind::Insert => Fetch::One,
        EndpointKind::GetById | EndpointKind::GetByUuid | EndpointKind::UpdateByUuid => {
            Fetch::Optional
        }
    }
}

fn render_handler(
    info: &TableInfo<'_>,
    endpoint: &EndpointDefinition,
    body: Option<&BodyStruct>,
) -> String {
    let mut out = String::with_capacity(1024);
    out.push_str(&doc_comment(
        Some(&format!(
            "{}\n\n`{} {}`",
            endpoint.description, endpoint.http_method, endpoint.path_template
        )),
        info.ctx,
    ));

    let mut extractors = vec!["    State(pool): State<PgPool>,".to_string()];
    if let Some(param) = endpoint.path_param() {
        extractors.push(format!(
            "    ApiPath({}): ApiPath<{}>,",
            path_ident(param),
            path_type(param)
        ));
    }
    if endpoint.is_paginated() {
        extractors.push("    ApiQuery(params): ApiQuery<ListParams>,".to_string());
    }
    let body = body.filter(|_| endpoint.has_body());
    if let Some(body) = body {
        extractors.push(format!("    ApiJson(body): ApiJson<{}>,", body.name));
    }

    let response = match fetch_mode(endpoint) {
        Fetch::All => "Vec<serde_json::Value>",
        Fetch::Optional | Fetch::One => "serde_json::Value",
    };
    let call = format!(
        "{}_query(&pool{})",
        endpoint.method_name,
        query_args(endpoint, body)
            .iter()
            .map(|a| format!(", {}", a.call))
            .collect::<String>()
    );

    out.push_str(&format!(
        "pub async fn {}(\n{}\n) -> Result<Json<{response}>, ApiError> {{\n",
        endpoint.method_name,
        extractors.join("\n")
    ));
    match fetch_mode(endpoint) {
        Fetch::All | Fetch::One => {
            out.push_str(&format!("    Ok(Json({call}.await?))\n"));
        }
        Fetch::Optional => {
            out.push_str(&format!(
                "    match {call}.await? {{\n        Some(row) => Ok(Json(row)),\n        None => Err(ApiError::not_found({:?})),\n    }}\n",
                format!("{} not found", info.name())
            ));
        }
    }
    out.push_str("}\n");
    out
}

fn render_query(endpoint: &EndpointDefinition, body: Option<&BodyStruct>) -> String {
    let body = body.filter(|_| endpoint.has_body());
    let (returns, fetch) = match fetch_mode(endpoint) {
        Fetch::All => ("Vec<serde_json::Value>", "fetch_all"),
        Fetch::Optional => ("Option<serde_json::Value>", "fetch_optional"),
        Fetch::One => ("serde_json::Value", "fetch_one"),
    };

    let mut params = vec!["pool: &PgPool".to_string()];
    params.extend(query_args(endpoint, body).into_iter().map(|a| a.decl));

    let mut out = String::with_capacity(512);
    out.push_str(&format!(
        "pub async fn {}_query({}) -> Result<{returns}, sqlx::Error> {{\n",
        endpoint.method_name,
        params.join(", ")
    ));
    out.push_str(&format!(
        "    sqlx::query_scalar::<_, serde_json::Value>({})\n",
        sql_const(endpoint)
    ));
    for bind in bind_exprs(endpoint) {
        out.push_str(&format!("        .bind({bind})\n"));
    }
    out.push_str(&format!("        .{fetch}(pool)\n        .await\n}}\n"));
    out
}

// ============================================================================
// Tests
// ============================================================================
