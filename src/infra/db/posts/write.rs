use async_trait::async_trait;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::PostRow;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, group_id, text, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, group_id, text, image, created_at
            "#,
        )
        .bind(params.author_id)
        .bind(params.group_id)
        .bind(&params.text)
        .bind(params.image.as_deref())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING id, author_id, group_id, text, image, created_at
            "#,
        )
        .bind(params.id)
        .bind(&params.text)
        .bind(params.group_id)
        .bind(params.image.as_deref())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
