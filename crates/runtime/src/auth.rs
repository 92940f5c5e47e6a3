//! # Bearer Authentication
//!
//! `Authorization: Bearer <token>` is accepted when the token exists in the
//! restriction table's token column. The check is one `SELECT` per request;
//! failures are 401 and the token is never echoed or logged.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sqlx::PgPool;

use crate::error::ApiError;

/// Existence check for bearer tokens
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    async fn token_exists(&self, token: &str) -> Result<bool, sqlx::Error>;
}

/// Token store shared by every route
pub type SharedTokenStore = Arc<dyn TokenStore>;

/// [`TokenStore`] backed by a single parameterized query
#[derive(Debug, Clone)]
pub struct PgTokenStore {
    pool: PgPool,
    query: String,
}

impl PgTokenStore {
    /// `query` must bind the token as `$1` and return a row when it exists.
    pub fn new(pool: PgPool, query: impl Into<String>) -> Self {
        Self {
            pool,
            query: query.into(),
        }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn token_exists(&self, token: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(&self.query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

/// The token of an `Authorization: Bearer ...` header, if well-formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware rejecting requests without a known bearer token.
///
/// Install with `axum::middleware::from_fn_with_state(store, require_bearer)`.
pub async fn require_bearer(
    State(store): State<SharedTokenStore>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        tracing::debug!(path = %request.uri().path(), "request without bearer token");
        return ApiError::Unauthorized.into_response();
    };

    match store.token_exists(&token).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::debug!(path = %request.uri().path(), "unknown bearer token");
            ApiError::Unauthorized.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "bearer token lookup failed");
            ApiError::Internal.into_response()
        }
    }
}
