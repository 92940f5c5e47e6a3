//! Request-body validation against the OpenAPI document.
//!
//! Each operation's `requestBody` schema is compiled once with `jsonschema`
//! when routes are bound. Bodies that fail it are rejected with 400 before
//! the handler runs, so type errors never reach the extractor.
//!
//! OpenAPI 3.0 schemas are not plain JSON Schema: `nullable: true` becomes a
//! `"null"` member of `type`, and `type` names outside JSON Schema (catalog
//! types such as `timestamp`) are dropped.

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonschema::Validator;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Largest request body buffered for validation
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const JSON_SCHEMA_TYPES: [&str; 7] = [
    "array", "boolean", "integer", "null", "number", "object", "string",
];

/// The JSON body schema of an OpenAPI operation, if it declares one.
pub fn body_schema(operation: &Value) -> Option<&Value> {
    operation.pointer("/requestBody/content/application~1json/schema")
}

/// Rewrite an OpenAPI 3.0 schema object into JSON Schema.
pub fn to_json_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(object) => {
            let nullable = object.get("nullable").and_then(Value::as_bool) == Some(true);
            let mut out = Map::new();
            for (key, value) in object {
                match key.as_str() {
                    "nullable" => {}
                    "properties" => {
                        let converted = match value.as_object() {
                            Some(fields) => Value::Object(
                                fields
                                    .iter()
                                    .map(|(name, field)| (name.clone(), to_json_schema(field)))
                                    .collect(),
                            ),
                            None => value.clone(),
                        };
                        out.insert(key.clone(), converted);
                    }
                    "type" => {
                        let Some(name) = value.as_str() else {
                            out.insert(key.clone(), value.clone());
                            continue;
                        };
                        if !JSON_SCHEMA_TYPES.contains(&name) {
                            continue;
                        }
                        let converted = if nullable && name != "null" {
                            serde_json::json!([name, "null"])
                        } else {
                            Value::String(name.to_string())
                        };
                        out.insert(key.clone(), converted);
                    }
                    _ => {
                        out.insert(key.clone(), to_json_schema(value));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_json_schema).collect()),
        other => other.clone(),
    }
}

/// Compiled body schema of one operation.
///
/// The object-level rules (`type`, `required`, ...) and each declared
/// property are compiled separately so failures can name the field.
#[derive(Clone)]
pub struct BodyRules {
    root: Arc<Validator>,
    properties: Vec<(String, Arc<Validator>)>,
}

impl std::fmt::Debug for BodyRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.properties.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("BodyRules").field("properties", &fields).finish()
    }
}

impl BodyRules {
    /// Compile an OpenAPI body schema. Errors carry the compiler's message.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let mut schema = to_json_schema(schema);
        let properties = match schema.as_object_mut() {
            Some(object) => match object.remove("properties") {
                Some(Value::Object(properties)) => properties,
                _ => Map::new(),
            },
            None => Map::new(),
        };

        let root = jsonschema::validator_for(&schema).map_err(|e| e.to_string())?;
        let properties = properties
            .into_iter()
            .map(|(name, property)| {
                jsonschema::validator_for(&property)
                    .map(|validator| (name.clone(), Arc::new(validator)))
                    .map_err(|e| format!("{name}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: Arc::new(root),
            properties,
        })
    }

    /// Every violation in `body`, field violations prefixed with the field.
    pub fn violations(&self, body: &Value) -> Vec<String> {
        let mut found: Vec<String> = self.root.iter_errors(body).map(|e| e.to_string()).collect();
        if let Some(object) = body.as_object() {
            for (name, validator) in &self.properties {
                if let Some(value) = object.get(name) {
                    found.extend(validator.iter_errors(value).map(|e| format!("{name}: {e}")));
                }
            }
        }
        found
    }

    pub fn check(&self, body: &Value) -> Result<(), ApiError> {
        let errors = self.violations(body);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation { errors })
        }
    }
}

/// Middleware enforcing [`BodyRules`] on a route.
///
/// The body is buffered, checked and handed on unchanged.
pub async fn validate_body(
    State(rules): State<Arc<BodyRules>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::bad_request("request body could not be read").into_response(),
    };
    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            return ApiError::bad_request(format!("request body is not valid JSON: {e}"))
                .into_response();
        }
    };
    if let Err(e) = rules.check(&value) {
        tracing::debug!(path = %parts.uri.path(), error = %e, "request body rejected");
        return e.into_response();
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
