//! Users handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::application::repos::ListUsersParams;
use crate::application::users::RegisterUserParams;

use super::error::{repo_to_api, ApiError};
use super::models::{CreateUserRequest, ListUsersQuery, UserResponse};
use super::HttpState;

pub async fn create_user(
    State(state): State<HttpState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required", None));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
            None,
        ));
    }

    let user = state
        .users
        .register_user(RegisterUserParams {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(repo_to_api)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn get_user(
    State(state): State<HttpState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user_by_id(id).await.map_err(repo_to_api)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn list_users(
    State(state): State<HttpState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = state
        .users
        .list_users(ListUsersParams { limit, offset })
        .await
        .map_err(repo_to_api)?;

    let body: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(body))
}
