//! # Endpoint Synthesizer
//!
//! Derives the REST endpoints of one table from its columns, identity mode
//! and foreign keys. Endpoints are plain data; the OpenAPI assembler and the
//! handler renderer both consume the same [`EndpointDefinition`]s.
//!
//! | Endpoint        | Method & Path                  | Condition            |
//! |-----------------|--------------------------------|----------------------|
//! | list            | `GET  /{table}/`               | always               |
//! | get-by-id       | `GET  /{table}/{id}`           | identity `ID`        |
//! | get-by-uuid     | `GET  /{table}/{uuid}`         | identity `UUID`      |
//! | list-children   | `GET  /{table}/{key}/{child}`  | per incoming FK      |
//! | insert          | `POST /{table}/`               | always               |
//! | update-by-uuid  | `PUT  /{table}/{uuid}`         | identity `UUID`      |

use std::collections::HashSet;

use catalyst_core::{HttpMethod, IdentityMode, ParamLocation, PgDataType};
use catalyst_ir::{ColumnDescriptor, ForeignKeyEdge, TableDescriptor};
use serde::Serialize;
use tracing::debug;

use crate::context::{GenerationContext, TableInfo};
use crate::sql;

/// Default `pagesize`
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound for `pagesize`
pub const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// Types
// ============================================================================

/// What an endpoint does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndpointKind {
    List,
    GetById,
    GetByUuid,
    ListChildren { child: String, edge: ForeignKeyEdge },
    Insert,
    UpdateByUuid,
}

/// Shape of the 200 response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResponseShape {
    /// `#/components/schemas/{table}_array`
    Array(String),
    /// `#/components/schemas/{table}`
    Object(String),
}

impl ResponseShape {
    /// Component schema name referenced by the response
    pub fn schema_name(&self) -> String {
        match self {
            ResponseShape::Array(table) => format!("{table}_array"),
            ResponseShape::Object(table) => table.clone(),
        }
    }

    pub fn schema_ref(&self) -> String {
        format!("#/components/schemas/{}", self.schema_name())
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ResponseShape::Array(_))
    }
}

/// One request parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: String,
    pub data_type: PgDataType,
    pub nullable: bool,
}

impl ParamSpec {
    fn query(name: &str, data_type: PgDataType, description: String) -> Self {
        Self {
            name: name.to_string(),
            location: ParamLocation::Query,
            required: false,
            description,
            data_type,
            nullable: false,
        }
    }

    fn path(column: &ColumnDescriptor) -> Self {
        Self {
            name: column.name.clone(),
            location: ParamLocation::Path,
            required: true,
            description: column.name.clone(),
            data_type: column.data_type.clone(),
            nullable: false,
        }
    }

    fn body(column: &ColumnDescriptor) -> Self {
        Self {
            name: column.name.clone(),
            location: ParamLocation::Body,
            required: true,
            description: column.name.clone(),
            data_type: column.data_type.clone(),
            nullable: column.nullable,
        }
    }
}

/// Source of each positional placeholder, in bind order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "name", rename_all = "snake_case")]
pub enum SqlParam {
    /// `%filter%`
    Filter,
    /// `pagesize` after clamping
    Limit,
    /// `page * pagesize`
    Offset,
    /// The path parameter with this name
    Path(String),
    /// The body field for this column
    Body(String),
}

/// A synthesized endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDefinition {
    /// Table the endpoint belongs to (first half of the operation id)
    pub table: String,

    /// Handler name (second half of the operation id)
    pub method_name: String,

    pub kind: EndpointKind,

    /// Human-readable description, also used as the summary
    pub description: String,

    /// OpenAPI path with `{param}` placeholders
    pub path_template: String,

    pub http_method: HttpMethod,

    pub parameters: Vec<ParamSpec>,

    /// `"{table}/{method_name}"`
    pub operation_id: String,

    pub sql_template: String,

    pub sql_param_order: Vec<SqlParam>,

    pub response: ResponseShape,
}

impl EndpointDefinition {
    pub fn path_param(&self) -> Option<&ParamSpec> {
        self.parameters
            .iter()
            .find(|p| p.location == ParamLocation::Path)
    }

    pub fn query_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Query)
    }

    pub fn body_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
    }

    pub fn has_body(&self) -> bool {
        self.http_method.is_mutating()
    }

    pub fn is_paginated(&self) -> bool {
        self.sql_param_order.contains(&SqlParam::Limit)
    }

    /// Whether a missing row is a 404 rather than an empty list
    pub fn returns_single_row(&self) -> bool {
        !self.response.is_array()
    }
}

/// Endpoints of one table plus the warnings raised while deriving them
#[derive(Debug, Clone, Default)]
pub struct Synthesized {
    pub endpoints: Vec<EndpointDefinition>,
    pub warnings: Vec<String>,
}

// ============================================================================
// Synthesis
// ============================================================================

/// Derive every endpoint of `table`, in a fixed order.
pub fn synthesize_table(ctx: &GenerationContext<'_>, table: &TableDescriptor) -> Synthesized {
    let info = TableInfo::new(table, ctx);
    let mut out = Synthesized::default();
    let mut names = HashSet::new();

    out.endpoints.push(list_endpoint(&info, &mut out.warnings));

    match table.identity_mode {
        IdentityMode::Uuid | IdentityMode::Id => {
            if let Some(endpoint) = get_endpoint(&info) {
                out.endpoints.push(endpoint);
            }
        }
        IdentityMode::None => {
            debug!(table = %table.name, "no identity column; skipping single-record endpoints");
        }
    }

    for endpoint in &out.endpoints {
        names.insert(endpoint.method_name.clone());
    }

    let mut seen_children = HashSet::new();
    for edge in info.child_edges() {
        let Some(child) = ctx.graph.table(&edge.from_table) else {
            continue;
        };
        let repeated = !seen_children.insert(child.name.clone());
        let endpoint = children_endpoint(&info, child, edge, repeated, &mut names);
        out.endpoints.push(endpoint);
    }

    out.endpoints.push(insert_endpoint(&info));

    if table.identity_mode == IdentityMode::Uuid {
        match update_endpoint(&info) {
            Some(endpoint) => out.endpoints.push(endpoint),
            None => out.warnings.push(format!(
                "table '{}' has no writable columns; update_by_uuid is not generated",
                table.name
            )),
        }
    }

    out
}

fn operation_id(table: &str, method: &str) -> String {
    format!("{table}/{method}")
}

fn pagination_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::query(
            "pagesize",
            PgDataType::Bigint,
            format!(
                "pagesize (optional. default is {}, max is {})",
                DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE
            ),
        ),
        ParamSpec::query("page", PgDataType::Bigint, "page (optional. default is 0)".to_string()),
        ParamSpec::query(
            "filter",
            PgDataType::Text,
            "filter (searches all string fields)".to_string(),
        ),
    ]
}

fn list_endpoint(info: &TableInfo<'_>, warnings: &mut Vec<String>) -> EndpointDefinition {
    let table = info.table;
    let restriction = info.restriction_join();
    if restriction.is_none() && !info.is_restriction_table() && info.ctx.has_restriction_table() {
        warnings.push(format!(
            "no join path from '{}' to '{}'; its list endpoint is unrestricted",
            table.name, info.ctx.config.restriction_table
        ));
    }

    EndpointDefinition {
        table: table.name.clone(),
        method_name: "get_all".to_string(),
        kind: EndpointKind::List,
        description: format!("Get all {}", info.plural_name()),
        path_template: format!("/{}/", table.name),
        http_method: HttpMethod::Get,
        parameters: pagination_params(),
        operation_id: operation_id(&table.name, "get_all"),
        sql_template: sql::list(table, restriction.as_ref()),
        sql_param_order: vec![SqlParam::Filter, SqlParam::Limit, SqlParam::Offset],
        response: ResponseShape::Array(table.name.clone()),
    }
}

fn get_endpoint(info: &TableInfo<'_>) -> Option<EndpointDefinition> {
    let table = info.table;
    let key = table.identity_column()?;
    let (method, kind) = match table.identity_mode {
        IdentityMode::Uuid => ("get_by_uuid", EndpointKind::GetByUuid),
        _ => ("get_by_id", EndpointKind::GetById),
    };

    Some(EndpointDefinition {
        table: table.name.clone(),
        method_name: method.to_string(),
        kind,
        description: format!("Get {} by {}", table.name, key.name),
        path_template: format!("/{}/{{{}}}", table.name, key.name),
        http_method: HttpMethod::Get,
        parameters: vec![ParamSpec::path(key)],
        operation_id: operation_id(&table.name, method),
        sql_template: sql::get_by(table, &key.name),
        sql_param_order: vec![SqlParam::Path(key.name.clone())],
        response: ResponseShape::Object(table.name.clone()),
    })
}

fn children_endpoint(
    info: &TableInfo<'_>,
    child: &TableDescriptor,
    edge: &ForeignKeyEdge,
    repeated: bool,
    names: &mut HashSet<String>,
) -> EndpointDefinition {
    let parent = info.table;
    // the parent's identity column when it has one, else the referenced column
    let key = parent
        .identity_column()
        .or_else(|| parent.column(&edge.to_column))
        .cloned()
        .unwrap_or_else(|| ColumnDescriptor::new(edge.to_column.clone(), PgDataType::Bigint));

    let child_ident = GenerationContext::snake(&child.name);
    let mut method = if repeated {
        format!("get_{}_by_{}", child_ident, GenerationContext::snake(&edge.from_column))
    } else {
        format!("get_{child_ident}")
    };
    if names.contains(&method) {
        method = format!("{method}_children");
    }
    let mut suffix = 2;
    let base = method.clone();
    while names.contains(&method) {
        method = format!("{base}_{suffix}");
        suffix += 1;
    }
    names.insert(method.clone());

    let mut path_template = format!("/{}/{{{}}}/{}", parent.name, key.name, child.name);
    if repeated {
        path_template.push('/');
        path_template.push_str(&edge.from_column);
    }

    let mut parameters = vec![ParamSpec::path(&key)];
    parameters.extend(pagination_params());

    EndpointDefinition {
        table: parent.name.clone(),
        method_name: method.clone(),
        kind: EndpointKind::ListChildren {
            child: child.name.clone(),
            edge: edge.clone(),
        },
        description: format!(
            "Get {} of {}",
            GenerationContext::pluralize(&child.name),
            parent.name
        ),
        path_template,
        http_method: HttpMethod::Get,
        parameters,
        operation_id: operation_id(&parent.name, &method),
        sql_template: sql::list_children(parent, child, edge, &key.name),
        sql_param_order: vec![
            SqlParam::Path(key.name.clone()),
            SqlParam::Filter,
            SqlParam::Limit,
            SqlParam::Offset,
        ],
        response: ResponseShape::Array(child.name.clone()),
    }
}

fn insert_endpoint(info: &TableInfo<'_>) -> EndpointDefinition {
    let table = info.table;
    let writable = table.writable_columns();

    EndpointDefinition {
        table: table.name.clone(),
        method_name: "insert".to_string(),
        kind: EndpointKind::Insert,
        description: format!("Create {}", table.name),
        path_template: format!("/{}/", table.name),
        http_method: HttpMethod::Post,
        parameters: writable.iter().map(|c| ParamSpec::body(c)).collect(),
        operation_id: operation_id(&table.name, "insert"),
        sql_template: sql::insert(table),
        sql_param_order: writable
            .iter()
            .map(|c| SqlParam::Body(c.name.clone()))
            .collect(),
        response: ResponseShape::Object(table.name.clone()),
    }
}

fn update_endpoint(info: &TableInfo<'_>) -> Option<EndpointDefinition> {
    let table = info.table;
    let sql_template = sql::update_by_uuid(table)?;
    let uuid = table.column("uuid")?;
    let writable = table.writable_columns();

    let mut parameters = vec![ParamSpec::path(uuid)];
    parameters.extend(writable.iter().map(|c| ParamSpec::body(c)));

    let mut sql_param_order: Vec<SqlParam> = writable
        .iter()
        .map(|c| SqlParam::Body(c.name.clone()))
        .collect();
    sql_param_order.push(SqlParam::Path("uuid".to_string()));

    Some(EndpointDefinition {
        table: table.name.clone(),
        method_name: "update_by_uuid".to_string(),
        kind: EndpointKind::UpdateByUuid,
        description: format!("Update {} by uuid", table.name),
        path_template: format!("/{}/{{uuid}}", table.name),
        http_method: HttpMethod::Put,
        parameters,
        operation_id: operation_id(&table.name, "update_by_uuid"),
        sql_template,
        sql_param_order,
        response: ResponseShape::Object(table.name.clone()),
    })
}

// ============================================================================
// Tests
// ============================================================================
