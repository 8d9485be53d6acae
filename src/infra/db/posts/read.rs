use async_trait::async_trait;
use sqlx::QueryBuilder;

use crate::application::pagination::PageWindow;
use crate::application::repos::{PostQueryFilter, PostsRepo, RepoError};
use crate::domain::entities::PostSummary;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::{POST_SUMMARY_SELECT, PostSummaryRow};

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts p WHERE 1=1 ");
        Self::apply_post_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        window: PageWindow,
    ) -> Result<Vec<PostSummary>, RepoError> {
        let offset = i64::try_from(window.offset)
            .map_err(|_| RepoError::InvalidInput {
                message: format!("page offset {} is out of range", window.offset),
            })?;

        let mut qb = QueryBuilder::new(POST_SUMMARY_SELECT);
        Self::apply_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id ASC LIMIT ");
        qb.push_bind(i64::from(window.limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostSummaryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostSummary::from).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostSummary>, RepoError> {
        let mut qb = QueryBuilder::new(POST_SUMMARY_SELECT);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostSummaryRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostSummary::from))
    }
}
