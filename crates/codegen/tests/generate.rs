//! End-to-end generation on the user / account / invoice schema.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use catalyst_codegen::{FileType, GeneratedProject, Generator, GeneratorConfig, OPENAPI_FILE, resolve};
use catalyst_ir::{ColumnDescriptor, EnumTable, ForeignKeyEdge, SchemaGraph, TableDescriptor};
use catalyst_runtime::{Controllers, TokenStore, bind_routes, route_bindings};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

fn billing() -> SchemaGraph {
    SchemaGraph::new(
        vec![
            TableDescriptor::new(
                "user",
                vec![ColumnDescriptor::bigint("id"), ColumnDescriptor::text("bearer_token")],
            ),
            TableDescriptor::new(
                "account",
                vec![
                    ColumnDescriptor::bigint("id"),
                    ColumnDescriptor::uuid("uuid").with_default("gen_random_uuid()"),
                    ColumnDescriptor::bigint("user_id"),
                ],
            ),
            TableDescriptor::new(
                "invoice",
                vec![ColumnDescriptor::bigint("id"), ColumnDescriptor::bigint("account_id")],
            ),
            TableDescriptor::new(
                "order_status",
                vec![ColumnDescriptor::bigint("id"), ColumnDescriptor::text("name")],
            ),
        ],
        vec![
            ForeignKeyEdge::new("account", "user_id", "user", "id"),
            ForeignKeyEdge::new("invoice", "account_id", "account", "id"),
        ],
    )
    .unwrap()
}

fn enums(graph: &SchemaGraph) -> Vec<EnumTable> {
    vec![
        EnumTable::from_rows(
            graph.table("order_status").unwrap(),
            &[json!({"id": 1, "name": "open"}), json!({"id": 2, "name": "closed"})],
        )
        .unwrap(),
    ]
}

fn generate() -> GeneratedProject {
    let graph = billing();
    Generator::default().generate(&graph, &enums(&graph)).unwrap()
}

fn document(project: &GeneratedProject) -> Value {
    serde_json::from_str(&project.file(OPENAPI_FILE).unwrap().content).unwrap()
}

// ── Join resolution ─────────────────────────────────────────────────────

#[test]
fn invoice_reaches_user_through_account() {
    let graph = billing();
    let path = resolve(&graph, "invoice", "user").unwrap();
    assert_eq!(path.table_chain, vec!["account", "user"]);
    assert_eq!(path.join_clauses.len(), 2);
}

#[test]
fn invoice_list_joins_before_where() {
    let project = generate();
    let invoice = &project.file("api/invoice.rs").unwrap().content;

    let first_join = invoice.find("JOIN account ON account.id = invoice.account_id").unwrap();
    let second_join = invoice.find("JOIN \"user\" ON \"user\".id = account.user_id").unwrap();
    let filter = invoice[second_join..].find(" where ").unwrap() + second_join;
    assert!(first_join < second_join);
    assert!(second_join < filter);
}

// ── Artifacts ───────────────────────────────────────────────────────────

#[test]
fn generation_is_idempotent() {
    let first = generate();
    let second = generate();
    let contents = |p: &GeneratedProject| -> Vec<(String, String)> {
        p.files
            .iter()
            .map(|f| (f.path.to_string_lossy().to_string(), f.content.clone()))
            .collect()
    };
    assert_eq!(contents(&first), contents(&second));
}

#[test]
fn generated_sources_parse() {
    let project = generate();
    let sources = project.files_by_type(FileType::Rust);
    assert_eq!(sources.len(), 7);
    for file in sources {
        if let Err(e) = syn::parse_file(&file.content) {
            panic!("{} does not parse: {e}\n{}", file.path.display(), file.content);
        }
    }
}

#[test]
fn document_covers_every_table() {
    let doc = document(&generate());
    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["servers"][0]["url"], "/api/v1");

    let paths = doc["paths"].as_object().unwrap();
    for path in ["/", "/account/", "/account/{uuid}", "/invoice/", "/invoice/{id}", "/user/"] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert_eq!(doc["paths"]["/account/"]["get"]["operationId"], "account/get_all");
    assert_eq!(
        doc["components"]["schemas"]["invoice"]["properties"]["account_id"]["type"],
        "integer"
    );
    assert_eq!(
        doc["paths"]["/invoice/"]["post"]["requestBody"]["content"]["application/json"]["schema"]
            ["required"],
        json!(["account_id"])
    );
}

#[test]
fn written_output_matches_generation() {
    let graph = billing();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");
    let generator = Generator::new(GeneratorConfig::default().with_output_dir(&out));

    let project = generator.generate_and_write(&graph, &enums(&graph)).unwrap();
    for file in &project.files {
        let on_disk = std::fs::read_to_string(out.join(&file.path)).unwrap();
        assert_eq!(on_disk, file.content);
    }

    // a rerun replaces the output byte for byte
    generator.generate_and_write(&graph, &enums(&graph)).unwrap();
    let again = std::fs::read_to_string(out.join(OPENAPI_FILE)).unwrap();
    assert_eq!(again, project.file(OPENAPI_FILE).unwrap().content);
}

// ── Binding the generated document ──────────────────────────────────────

struct OneToken;

#[async_trait]
impl TokenStore for OneToken {
    async fn token_exists(&self, token: &str) -> Result<bool, sqlx::Error> {
        Ok(token == "secret")
    }
}

async fn stub() -> StatusCode {
    StatusCode::OK
}

fn bound_router() -> axum::Router {
    let doc = document(&generate());
    let mut controllers = Controllers::<()>::new();
    for binding in route_bindings(&doc).unwrap() {
        if binding.operation_id != "test/ping" {
            controllers.register(&binding.table, &binding.handler, stub);
        }
    }
    bind_routes(&doc, controllers, OneToken).unwrap()
}

async fn call(
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
    let response = bound_router().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn every_operation_binds() {
    let (status, _) = call("GET", "/api/v1/invoice/", Some("secret"), None).await;
    assert_eq!(status, StatusCode::OK);
    let children = "/api/v1/account/00000000-0000-0000-0000-000000000000/invoice";
    let (status, _) = call("GET", children, Some("secret"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call("GET", "/api/v1/", Some("secret"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn generated_routes_require_a_token() {
    let (status, body) = call("GET", "/api/v1/invoice/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn post_missing_a_required_column_is_rejected() {
    let (status, body) = call("POST", "/api/v1/invoice/", Some("secret"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["message"].as_str().unwrap().contains("account_id"));

    let wrong = json!({ "account_id": "abc" });
    let (status, body) = call("POST", "/api/v1/invoice/", Some("secret"), Some(wrong)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["message"].as_str().unwrap().contains("account_id: "));

    let (status, _) = call(
        "POST",
        "/api/v1/invoice/",
        Some("secret"),
        Some(json!({ "account_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
