use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::PageWindow;
use crate::domain::entities::{
    AuthorRecord, CommentRecord, FollowRecord, GroupRecord, PostRecord, PostSummary,
};

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

/// Narrowing applied to post listings. Filters combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PostQueryFilter {
    pub group_id: Option<i64>,
    pub author_id: Option<i64>,
    /// Only posts by authors this author follows.
    pub followed_by: Option<i64>,
}

impl PostQueryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn group(group_id: i64) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    pub fn author(author_id: i64) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn followed_by(follower_id: i64) -> Self {
        Self {
            followed_by: Some(follower_id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateGroupParams {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i64,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[async_trait]
pub trait AuthorsRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<AuthorRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<AuthorRecord>, RepoError>;

    /// Return the author with this username, creating it on first sight.
    async fn ensure_author(&self, username: &str) -> Result<AuthorRecord, RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<GroupRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError>;
}

/// Read side of posts. Listings are ordered newest first, ties by id ascending.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn count_posts(&self, filter: &PostQueryFilter) -> Result<u64, RepoError>;

    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        window: PageWindow,
    ) -> Result<Vec<PostSummary>, RepoError>;

    async fn find_post(&self, id: i64) -> Result<Option<PostSummary>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    /// Create the pair; `None` when it already existed.
    async fn follow(
        &self,
        follower_id: i64,
        author_id: i64,
    ) -> Result<Option<FollowRecord>, RepoError>;

    /// Remove the pair; `false` when there was nothing to remove.
    async fn unfollow(&self, follower_id: i64, author_id: i64) -> Result<bool, RepoError>;

    async fn is_following(&self, follower_id: i64, author_id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
