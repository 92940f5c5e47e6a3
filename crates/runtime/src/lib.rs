//! # Catalyst Runtime
//!
//! Support code linked into every generated API:
//!
//! - [`ApiError`] - JSON error responses with SQLSTATE classification
//! - [`ListParams`] - `pagesize` / `page` / `filter` query parameters
//! - [`require_bearer`] - bearer-token middleware backed by a [`TokenStore`]
//! - [`ApiPath`] / [`ApiQuery`] / [`ApiJson`] - extractors rejecting with [`ApiError`]
//! - [`validate_body`] - `jsonschema` checks of the OpenAPI request body
//! - [`bind_routes`] - mounts registered [`Controllers`] on the paths of an
//!   OpenAPI document

pub mod auth;
pub mod binder;
pub mod error;
pub mod extract;
pub mod params;
pub mod validate;

pub use auth::{PgTokenStore, SharedTokenStore, TokenStore, bearer_token, require_bearer};
pub use binder::{
    BindError, Controllers, PING_OPERATION, RouteBinding, base_path, bind_routes, load_document,
    route_bindings, router_path,
};
pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use params::{DEFAULT_PAGE_SIZE, ListParams, MAX_PAGE_SIZE};
pub use validate::{BodyRules, MAX_BODY_BYTES, body_schema, to_json_schema, validate_body};
