//! Postgres-backed repository implementations.

mod authors;
mod comments;
mod follows;
mod groups;
mod posts;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthRepo, PostQueryFilter, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostQueryFilter) {
        if let Some(group_id) = filter.group_id {
            qb.push(" AND p.group_id = ");
            qb.push_bind(group_id);
        }

        if let Some(author_id) = filter.author_id {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
        }

        if let Some(follower_id) = filter.followed_by {
            qb.push(" AND p.author_id IN (SELECT f.author_id FROM follows f WHERE f.follower_id = ");
            qb.push_bind(follower_id);
            qb.push(")");
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }
}
