//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub user_id: i64,
    pub content: String,
}

/// Offset pagination over one user's posts, newest first.
#[derive(Debug, Clone, Copy)]
pub struct ListPostsByUserParams {
    pub user_id: i64,
    pub limit: i32,
    pub offset: i32,
}

/// Post persistence port.
///
/// `CachedPostRepository` decorates any implementation of this trait, so the
/// cached and plain repositories are interchangeable at every call site.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn get_post(&self, id: i64) -> Result<PostRecord, RepoError>;

    async fn list_posts_by_user(
        &self,
        params: ListPostsByUserParams,
    ) -> Result<Vec<PostRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct UpdateUserParams {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ListUsersParams {
    pub limit: i32,
    pub offset: i32,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn get_user_by_id(&self, id: i64) -> Result<UserRecord, RepoError>;

    async fn get_user_by_email(&self, email: &str) -> Result<UserRecord, RepoError>;

    async fn list_users(&self, params: ListUsersParams) -> Result<Vec<UserRecord>, RepoError>;

    async fn update_user(&self, params: UpdateUserParams) -> Result<UserRecord, RepoError>;

    async fn delete_user(&self, id: i64) -> Result<(), RepoError>;
}
