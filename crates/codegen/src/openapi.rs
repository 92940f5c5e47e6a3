//! # OpenAPI Assembler
//!
//! Accumulates endpoint definitions into a single OpenAPI 3.0.0 document.
//! The builder is created once per run and every endpoint is attached to it
//! in table order, so the serialized document is deterministic.

use catalyst_core::{EngineError, EngineResult, ParamLocation};
use catalyst_ir::{ColumnDescriptor, TableDescriptor};
use serde_json::{Map, Value, json};

use crate::GeneratorConfig;
use crate::endpoint::{EndpointDefinition, ParamSpec};

/// File name of the generated document
pub const OPENAPI_FILE: &str = "openapi.3.0.0.json";

/// Name of the security scheme every operation requires
pub const SECURITY_SCHEME: &str = "bearerAuth";

/// Operation id of the built-in ping operation
pub const PING_OPERATION: &str = "test/ping";

/// Explicit builder for the OpenAPI document
#[derive(Debug, Clone)]
pub struct OpenApiBuilder {
    info: Value,
    servers: Value,
    paths: Map<String, Value>,
    schemas: Map<String, Value>,
    tags: Vec<Value>,
}

impl OpenApiBuilder {
    /// Start a document with `info`, `servers`, the bearer security scheme
    /// and the `/` ping operation.
    pub fn new(config: &GeneratorConfig) -> Self {
        let mut paths = Map::new();
        paths.insert(
            "/".to_string(),
            json!({
                "get": {
                    "operationId": PING_OPERATION,
                    "tags": ["Test"],
                    "description": "Ping test, returns 200 OK",
                    "summary": "Ping test, returns 200 OK",
                    "security": [{ SECURITY_SCHEME: [] }],
                    "responses": {
                        "200": { "description": "OK" }
                    }
                }
            }),
        );

        Self {
            info: json!({
                "title": format!("{} REST API", config.api_name),
                "description": format!("Interactive REST API documentation for {}", config.api_name),
                "version": config.api_version,
            }),
            servers: json!([{ "url": config.api_prefix }]),
            paths,
            schemas: Map::new(),
            tags: vec![json!({ "name": "Test", "description": "Test" })],
        }
    }

    /// Attach one endpoint of `table` to the document.
    ///
    /// `post` and `put` endpoints also ensure the table's object and array
    /// schemas and get a request body listing every writable column.
    pub fn attach(&mut self, table: &TableDescriptor, endpoint: &EndpointDefinition) {
        self.ensure_tag(&endpoint.table);

        let mut operation = Map::new();
        let parameters: Vec<Value> = endpoint
            .parameters
            .iter()
            .filter(|p| p.location != ParamLocation::Body)
            .map(parameter)
            .collect();
        if !parameters.is_empty() {
            operation.insert("parameters".into(), Value::Array(parameters));
        }
        operation.insert("description".into(), json!(endpoint.description));
        operation.insert("summary".into(), json!(endpoint.description));
        operation.insert("operationId".into(), json!(endpoint.operation_id));
        operation.insert(
            "responses".into(),
            json!({
                "200": {
                    "description": "successful operation",
                    "content": {
                        "application/json": {
                            "schema": { "$ref": endpoint.response.schema_ref() }
                        }
                    }
                },
                "400": { "description": "Bad Request" }
            }),
        );
        operation.insert("security".into(), json!([{ SECURITY_SCHEME: [] }]));
        operation.insert("tags".into(), json!([endpoint.table]));

        if endpoint.has_body() {
            self.ensure_schemas(table);
            let body: Vec<&ParamSpec> = endpoint.body_params().collect();
            operation.insert("requestBody".into(), request_body(table, &body));
        }

        let item = self
            .paths
            .entry(endpoint.path_template.clone())
            .or_insert_with(|| json!({}));
        if let Value::Object(methods) = item {
            methods.insert(endpoint.http_method.as_str().to_string(), Value::Object(operation));
        }
    }

    /// Create the `{table}` and `{table}_array` schemas unless present.
    pub fn ensure_schemas(&mut self, table: &TableDescriptor) {
        if self.has_schema(&table.name) {
            return;
        }
        let properties: Map<String, Value> = table
            .projected_columns()
            .into_iter()
            .map(|c| (c.name.clone(), column_schema(c)))
            .collect();

        self.schemas.insert(
            table.name.clone(),
            json!({ "type": "object", "properties": properties }),
        );
        self.schemas.insert(
            format!("{}_array", table.name),
            json!({
                "type": "array",
                "items": { "$ref": format!("#/components/schemas/{}", table.name) }
            }),
        );
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t["name"] == name)
    }

    fn ensure_tag(&mut self, name: &str) {
        if !self.has_tag(name) {
            self.tags.push(json!({ "name": name, "description": name }));
        }
    }

    /// Number of path templates, including `/`
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// The assembled document
    pub fn document(&self) -> Value {
        json!({
            "openapi": "3.0.0",
            "info": self.info,
            "servers": self.servers,
            "components": {
                "securitySchemes": {
                    SECURITY_SCHEME: { "type": "http", "scheme": "bearer" }
                },
                "schemas": self.schemas,
            },
            "tags": self.tags,
            "paths": self.paths,
        })
    }

    pub fn into_document(self) -> Value {
        self.document()
    }

    /// Pretty-printed document with a trailing newline
    pub fn to_json_pretty(&self) -> EngineResult<String> {
        let mut out = serde_json::to_string_pretty(&self.document())?;
        out.push('\n');
        Ok(out)
    }
}

fn type_schema(param: &ParamSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(param.data_type.openapi_type()));
    if let Some(format) = param.data_type.openapi_format() {
        schema.insert("format".into(), json!(format));
    }
    Value::Object(schema)
}

fn parameter(param: &ParamSpec) -> Value {
    json!({
        "name": param.name,
        "in": param.location.as_str(),
        "description": param.description,
        "required": param.required,
        "schema": type_schema(param),
    })
}

fn column_schema(column: &ColumnDescriptor) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(column.data_type.openapi_type()));
    if let Some(format) = column.data_type.openapi_format() {
        schema.insert("format".into(), json!(format));
    }
    schema.insert("description".into(), json!(column.name));
    schema.insert("example".into(), column.data_type.openapi_example(&column.name));
    if column.nullable {
        schema.insert("nullable".into(), json!(true));
    }
    Value::Object(schema)
}

fn request_body(table: &TableDescriptor, body: &[&ParamSpec]) -> Value {
    let properties: Map<String, Value> = body
        .iter()
        .filter_map(|p| table.column(&p.name))
        .map(|c| (c.name.clone(), column_schema(c)))
        .collect();
    let required: Vec<&str> = body
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), json!(required));
    }

    json!({
        "description": format!("{} object", table.name),
        "required": true,
        "content": {
            "application/json": { "schema": Value::Object(schema) }
        }
    })
}

/// Parse a document back from disk, checking the handful of fields the
/// route binder relies on.
pub fn parse_document(text: &str) -> EngineResult<Value> {
    let document: Value = serde_json::from_str(text)?;
    if document.get("openapi").and_then(Value::as_str).is_none() {
        return Err(EngineError::InvalidDocument("missing 'openapi' version".into()));
    }
    if !document.get("paths").is_some_and(Value::is_object) {
        return Err(EngineError::InvalidDocument("missing 'paths' object".into()));
    }
    Ok(document)
}

// ============================================================================
// Tests
// ============================================================================
