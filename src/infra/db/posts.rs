use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CreatePostParams, ListPostsByUserParams, PostsRepo, RepoError,
};
use crate::domain::entities::PostRecord;

use super::types::PostRow;
use super::{map_sqlx_error, PostgresRepositories};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, PostRow>(
            "INSERT INTO posts (user_id, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) \
             RETURNING id, user_id, content, created_at, updated_at",
        )
        .bind(params.user_id)
        .bind(&params.content)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn get_post(&self, id: i64) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, user_id, content, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn list_posts_by_user(
        &self,
        params: ListPostsByUserParams,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(
            "SELECT id, user_id, content, created_at, updated_at FROM posts \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(params.user_id)
        .bind(i64::from(params.limit))
        .bind(i64::from(params.offset))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }
}
