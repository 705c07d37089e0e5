//! HTTP surface: axum router, handlers, and error mapping.

pub mod error;
pub mod models;
mod posts;
mod users;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use crate::application::posts::PostService;
use crate::application::users::UserService;
use crate::cache::CacheMetrics;
use crate::infra::db::PostgresRepositories;

use error::ApiError;

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
    pub metrics: Arc<CacheMetrics>,
    pub db: Arc<PostgresRepositories>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/v1/posts", post(posts::create_post))
        .route("/api/v1/posts/{id}", get(posts::get_post))
        .route(
            "/api/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/v1/users/{id}", get(users::get_user))
        .route("/api/v1/users/{id}/posts", get(posts::list_posts_by_user))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn health(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .health_check()
        .await
        .map_err(|err| ApiError::unavailable("database unreachable", Some(err.to_string())))?;
    Ok(StatusCode::OK)
}

async fn metrics(State(state): State<HttpState>) -> Result<impl IntoResponse, ApiError> {
    let body = state
        .metrics
        .encode()
        .map_err(|err| ApiError::internal("metrics encoding failed", Some(err)))?;
    Ok(([("content-type", "text/plain; version=0.0.4")], body))
}
