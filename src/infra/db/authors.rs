use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{AuthorsRepo, RepoError};
use crate::domain::entities::AuthorRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: i64,
    username: String,
    display_name: String,
    created_at: OffsetDateTime,
}

impl From<AuthorRow> for AuthorRecord {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AuthorsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, username, display_name, created_at FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError> {
        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT id, username, display_name, created_at FROM authors WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AuthorRecord::from))
    }

    async fn ensure_author(&self, username: &str) -> Result<AuthorRecord, RepoError> {
        // The no-op update makes RETURNING yield the row on conflict too.
        let row = sqlx::query_as::<_, AuthorRow>(
            r#"
            INSERT INTO authors (username)
            VALUES ($1)
            ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username
            RETURNING id, username, display_name, created_at
            "#,
        )
        .bind(username)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
