//! Post application service.

use std::sync::Arc;

use crate::application::repos::{
    CreatePostParams, ListPostsByUserParams, PostsRepo, RepoError,
};
use crate::domain::entities::PostRecord;

/// Business-logic seam over the post repository port.
///
/// Holds whichever `PostsRepo` the bootstrap wired in; in production that is
/// the cached decorator around the Postgres repository.
pub struct PostService {
    repo: Arc<dyn PostsRepo>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.repo.create_post(params).await
    }

    pub async fn get_post(&self, id: i64) -> Result<PostRecord, RepoError> {
        self.repo.get_post(id).await
    }

    pub async fn list_posts_by_user(
        &self,
        params: ListPostsByUserParams,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.repo.list_posts_by_user(params).await
    }
}
