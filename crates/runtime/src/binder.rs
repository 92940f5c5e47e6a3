//! # Route Binder
//!
//! Reads a generated OpenAPI document and wires every path + method to the
//! handler named by its `operationId` (`"{table}/{method}"`).
//!
//! ```text
//! servers[0].url + path template ──► axum route
//! operationId "invoice/get_all"  ──► Controllers["invoice/get_all"]
//! requestBody schema             ──► BodyRules (jsonschema) + validate_body layer
//! every route                    ──► require_bearer route layer
//! ```
//!
//! axum 0.8 captures path parameters with the same `{name}` syntax as
//! OpenAPI, so templates are mounted as written.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{MethodFilter, MethodRouter, on};
use serde_json::Value;
use thiserror::Error;

use crate::auth::{SharedTokenStore, TokenStore, require_bearer};
use crate::validate::{BodyRules, body_schema, validate_body};

/// Operation id served by the built-in ping handler when not registered
pub const PING_OPERATION: &str = "test/ping";

/// Errors raised while binding a document
#[derive(Debug, Error)]
pub enum BindError {
    #[error("failed to read OpenAPI document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OpenAPI document has no 'paths' object")]
    MissingPaths,

    #[error("operation {method} {path} has no operationId")]
    MissingOperationId { path: String, method: String },

    #[error("operationId '{0}' is not of the form 'table/method'")]
    MalformedOperationId(String),

    #[error("no handler registered for operationId '{0}'")]
    UnknownHandler(String),

    #[error("request body schema of '{operation_id}' does not compile: {message}")]
    InvalidSchema {
        operation_id: String,
        message: String,
    },

    #[error("OpenAPI document defines no operations")]
    NoRoutes,
}

// ============================================================================
// Controllers
// ============================================================================

type Mount<S> = Box<dyn Fn(MethodFilter) -> MethodRouter<S> + Send + Sync>;

/// Handlers keyed by operation id
pub struct Controllers<S> {
    handlers: HashMap<String, Mount<S>>,
}

impl<S> Default for Controllers<S> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<S> std::fmt::Debug for Controllers<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("Controllers").field("operations", &ids).finish()
    }
}

impl<S> Controllers<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `{table}/{method}`, replacing any previous one.
    pub fn register<H, T>(&mut self, table: &str, method: &str, handler: H) -> &mut Self
    where
        H: Handler<T, S> + Sync,
        T: 'static,
    {
        let mount: Mount<S> = Box::new(move |filter| on(filter, handler.clone()));
        self.handlers.insert(format!("{table}/{method}"), mount);
        self
    }

    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn mount(&self, operation_id: &str, filter: MethodFilter) -> Option<MethodRouter<S>> {
        self.handlers.get(operation_id).map(|mount| mount(filter))
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// One operation of the document, resolved to its router path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    /// Path template as written in the document
    pub path: String,
    /// Prefix + template, as mounted
    pub router_path: String,
    /// Lowercase HTTP method
    pub method: String,
    pub operation_id: String,
    pub table: String,
    pub handler: String,
    /// JSON request body schema, as written in the document
    pub body_schema: Option<Value>,
}

fn method_filter(method: &str) -> Option<MethodFilter> {
    match method {
        "get" => Some(MethodFilter::GET),
        "post" => Some(MethodFilter::POST),
        "put" => Some(MethodFilter::PUT),
        "patch" => Some(MethodFilter::PATCH),
        "delete" => Some(MethodFilter::DELETE),
        "head" => Some(MethodFilter::HEAD),
        "options" => Some(MethodFilter::OPTIONS),
        "trace" => Some(MethodFilter::TRACE),
        _ => None,
    }
}

/// Mount prefix taken from `servers[0].url`, without a trailing `/`.
///
/// Absolute URLs contribute only their path.
pub fn base_path(document: &Value) -> String {
    let Some(url) = document.pointer("/servers/0/url").and_then(Value::as_str) else {
        return String::new();
    };
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |at| &rest[at..]),
        None => url,
    };
    path.trim_end_matches('/').to_string()
}

/// Join the mount prefix and a path template.
pub fn router_path(prefix: &str, template: &str) -> String {
    let template = if template.starts_with('/') {
        template.to_string()
    } else {
        format!("/{template}")
    };
    format!("{prefix}{template}")
}

/// Every operation in the document, in path then method order.
pub fn route_bindings(document: &Value) -> Result<Vec<RouteBinding>, BindError> {
    let prefix = base_path(document);
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or(BindError::MissingPaths)?;

    let mut bindings = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (method, operation) in item {
            if method_filter(method).is_none() {
                continue;
            }
            let operation_id = operation
                .get("operationId")
                .and_then(Value::as_str)
                .ok_or_else(|| BindError::MissingOperationId {
                    path: path.clone(),
                    method: method.clone(),
                })?;
            let (table, handler) = operation_id
                .split_once('/')
                .filter(|(t, h)| !t.is_empty() && !h.is_empty())
                .ok_or_else(|| BindError::MalformedOperationId(operation_id.to_string()))?;

            bindings.push(RouteBinding {
                path: path.clone(),
                router_path: router_path(&prefix, path),
                method: method.clone(),
                operation_id: operation_id.to_string(),
                table: table.to_string(),
                handler: handler.to_string(),
                body_schema: body_schema(operation).cloned(),
            });
        }
    }
    Ok(bindings)
}

async fn ping() -> StatusCode {
    StatusCode::OK
}

/// Build the router for `document`.
///
/// Operations with a body get a [`validate_body`] layer over their compiled
/// schema; every route gets
/// [`require_bearer`]. Paths ending in `/` are also mounted without it.
pub fn bind_routes<S, T>(
    document: &Value,
    controllers: Controllers<S>,
    tokens: T,
) -> Result<Router<S>, BindError>
where
    S: Clone + Send + Sync + 'static,
    T: TokenStore,
{
    let bindings = route_bindings(document)?;
    if bindings.is_empty() {
        return Err(BindError::NoRoutes);
    }

    let mut grouped: BTreeMap<String, MethodRouter<S>> = BTreeMap::new();
    for binding in &bindings {
        let Some(filter) = method_filter(&binding.method) else {
            continue;
        };
        let mut route = match controllers.mount(&binding.operation_id, filter) {
            Some(route) => route,
            None if binding.operation_id == PING_OPERATION => on(filter, ping),
            None => return Err(BindError::UnknownHandler(binding.operation_id.clone())),
        };
        if let Some(schema) = &binding.body_schema {
            let rules = BodyRules::compile(schema).map_err(|message| BindError::InvalidSchema {
                operation_id: binding.operation_id.clone(),
                message,
            })?;
            route = route.layer(from_fn_with_state(Arc::new(rules), validate_body));
        }

        let merged = match grouped.remove(&binding.router_path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        grouped.insert(binding.router_path.clone(), merged);
        tracing::debug!(
            method = %binding.method,
            path = %binding.router_path,
            operation = %binding.operation_id,
            "route bound"
        );
    }

    let mounted: BTreeSet<String> = grouped.keys().cloned().collect();
    let mut router = Router::new();
    for (path, route) in grouped {
        let alias = path.trim_end_matches('/');
        if !alias.is_empty() && alias != path && !mounted.contains(alias) {
            router = router.route(alias, route.clone());
        }
        router = router.route(&path, route);
    }

    let store: SharedTokenStore = Arc::new(tokens);
    tracing::info!(routes = bindings.len(), "routes bound from OpenAPI document");
    Ok(router.route_layer(from_fn_with_state(store, require_bearer)))
}

/// Read and parse an OpenAPI document from disk.
pub async fn load_document(path: impl AsRef<Path>) -> Result<Value, BindError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BindError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let document: Value = serde_json::from_str(&text)?;
    if !document.get("paths").is_some_and(Value::is_object) {
        return Err(BindError::MissingPaths);
    }
    Ok(document)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::Json;
    use axum::body::Body;
    use axum::extract::Path as PathParam;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    struct StaticTokens(Vec<&'static str>);

    #[async_trait]
    impl TokenStore for StaticTokens {
        async fn token_exists(&self, token: &str) -> Result<bool, sqlx::Error> {
            Ok(self.0.contains(&token))
        }
    }

    fn document() -> Value {
        json!({
            "openapi": "3.0.0",
            "servers": [{ "url": "/api/v1" }],
            "paths": {
                "/": { "get": { "operationId": "test/ping" } },
                "/account/": {
                    "get": { "operationId": "account/get_all" },
                    "post": {
                        "operationId": "account/insert",
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "user_id": { "type": "integer" },
                                            "nickname": { "type": "string", "nullable": true }
                                        },
                                        "required": ["user_id"]
                                    }
                                }
                            }
                        }
                    }
                },
                "/account/{uuid}": { "get": { "operationId": "account/get_by_uuid" } }
            }
        })
    }

    async fn get_all() -> Json<Value> {
        Json(json!([{ "uuid": "a" }]))
    }

    async fn get_by_uuid(PathParam(uuid): PathParam<String>) -> Json<Value> {
        Json(json!({ "uuid": uuid }))
    }

    async fn insert(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    fn controllers() -> Controllers<()> {
        let mut controllers = Controllers::new();
        controllers.register("account", "get_all", get_all);
        controllers.register("account", "get_by_uuid", get_by_uuid);
        controllers.register("account", "insert", insert);
        controllers
    }

    fn router() -> Router {
        bind_routes(&document(), controllers(), StaticTokens(vec!["good"])).unwrap()
    }

    async fn send(
        router: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[test]
    fn test_route_bindings() {
        let bindings = route_bindings(&document()).unwrap();
        let summary: Vec<(&str, &str, &str)> = bindings
            .iter()
            .map(|b| (b.method.as_str(), b.router_path.as_str(), b.operation_id.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("get", "/api/v1/", "test/ping"),
                ("get", "/api/v1/account/", "account/get_all"),
                ("post", "/api/v1/account/", "account/insert"),
                ("get", "/api/v1/account/{uuid}", "account/get_by_uuid"),
            ]
        );
        assert_eq!(bindings[2].table, "account");
        assert_eq!(bindings[2].handler, "insert");
        assert_eq!(bindings[2].body_schema.as_ref().unwrap()["required"], json!(["user_id"]));
        assert!(bindings[1].body_schema.is_none());
    }

    #[test]
    fn test_base_path() {
        assert_eq!(base_path(&json!({"servers": [{"url": "/api/v1/"}]})), "/api/v1");
        assert_eq!(base_path(&json!({"servers": [{"url": "https://example.com/v2"}]})), "/v2");
        assert_eq!(base_path(&json!({"servers": [{"url": "https://example.com"}]})), "");
        assert_eq!(base_path(&json!({})), "");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(route_bindings(&json!({})), Err(BindError::MissingPaths)));
        let no_id = json!({"paths": {"/x/": {"get": {}}}});
        assert!(matches!(route_bindings(&no_id), Err(BindError::MissingOperationId { .. })));
        let bad_id = json!({"paths": {"/x/": {"get": {"operationId": "flat"}}}});
        assert!(matches!(route_bindings(&bad_id), Err(BindError::MalformedOperationId(_))));
        let empty = json!({"paths": {}});
        let err = bind_routes(&empty, Controllers::<()>::new(), StaticTokens(vec![])).unwrap_err();
        assert!(matches!(err, BindError::NoRoutes));
    }

    #[test]
    fn test_unknown_handler() {
        let mut doc = document();
        doc["paths"]["/account/{uuid}"]["put"] = json!({ "operationId": "account/update_by_uuid" });
        let err = bind_routes(&doc, controllers(), StaticTokens(vec![])).unwrap_err();
        assert!(matches!(err, BindError::UnknownHandler(id) if id == "account/update_by_uuid"));
    }

    #[tokio::test]
    async fn test_requests_without_token_are_rejected() {
        let (status, body) = send(router(), "GET", "/api/v1/account/", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, body) = send(router(), "GET", "/api/v1/account/", Some("forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.to_string().contains("forged"));
    }

    #[tokio::test]
    async fn test_bound_handlers_serve_requests() {
        let (status, body) = send(router(), "GET", "/api/v1/account/", Some("good"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{ "uuid": "a" }]));

        let (status, body) = send(router(), "GET", "/api/v1/account", Some("good"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["uuid"], "a");

        let (status, body) = send(router(), "GET", "/api/v1/account/abc", Some("good"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uuid"], "abc");

        let (status, _) = send(router(), "GET", "/api/v1/", Some("good"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_body_is_validated() {
        let (status, body) =
            send(router(), "POST", "/api/v1/account/", Some("good"), Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert!(body["message"].as_str().unwrap().contains("\"user_id\" is a required property"));

        let (status, body) =
            send(router(), "POST", "/api/v1/account/", Some("good"), Some(json!({"user_id": 7}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], 7);
    }

    #[tokio::test]
    async fn test_post_body_types_are_validated() {
        let wrong = json!({ "user_id": "abc" });
        let (status, body) = send(router(), "POST", "/api/v1/account/", Some("good"), Some(wrong)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert!(body["message"].as_str().unwrap().contains("user_id: "));

        let nullable = json!({ "user_id": 7, "nickname": null });
        let (status, _) = send(router(), "POST", "/api/v1/account/", Some("good"), Some(nullable)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_uncompilable_schema_is_a_bind_error() {
        let mut doc = document();
        doc["paths"]["/account/"]["post"]["requestBody"]["content"]["application/json"]["schema"] =
            json!({ "type": "object", "minProperties": "two" });
        let err = bind_routes(&doc, controllers(), StaticTokens(vec![])).unwrap_err();
        assert!(matches!(err, BindError::InvalidSchema { operation_id, .. } if operation_id == "account/insert"));
    }

    #[tokio::test]
    async fn test_load_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.3.0.0.json");
        tokio::fs::write(&path, document().to_string()).await.unwrap();
        let loaded = load_document(&path).await.unwrap();
        assert_eq!(loaded, document());

        let missing = load_document(dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(missing, BindError::Io { .. }));
    }
}
