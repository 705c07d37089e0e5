//! Posts handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::repos::{CreatePostParams, ListPostsByUserParams};

use super::error::{repo_to_api, ApiError};
use super::models::{CreatePostRequest, ListPostsQuery, PostResponse};
use super::HttpState;

const DEFAULT_PAGE_SIZE: i32 = 10;
const MAX_PAGE_SIZE: i32 = 100;

pub async fn create_post(
    State(state): State<HttpState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.content.is_empty() {
        return Err(ApiError::bad_request("content must not be empty", None));
    }

    let post = state
        .posts
        .create_post(CreatePostParams {
            user_id: payload.user_id,
            content: payload.content,
        })
        .await
        .map_err(repo_to_api)?;

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn get_post(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_post(id).await.map_err(repo_to_api)?;
    Ok(Json(PostResponse::from(post)))
}

pub async fn list_posts_by_user(
    State(state): State<HttpState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListPostsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::bad_request(
            "limit must be between 1 and 100",
            None,
        ));
    }
    if offset < 0 {
        return Err(ApiError::bad_request("offset must not be negative", None));
    }

    let posts = state
        .posts
        .list_posts_by_user(ListPostsByUserParams {
            user_id,
            limit,
            offset,
        })
        .await
        .map_err(repo_to_api)?;

    let body: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(body))
}
