use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{AuthorsRepo, FollowsRepo, RepoError};
use crate::domain::entities::AuthorRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    Removed,
    NotFollowing,
}

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error("authors cannot follow themselves")]
    SelfFollow,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    authors: Arc<dyn AuthorsRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(authors: Arc<dyn AuthorsRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { authors, follows }
    }

    /// Follow `username`. Repeating the call changes nothing.
    pub async fn follow(
        &self,
        actor: &AuthorRecord,
        username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let target = self.require_author(username).await?;
        if target.id == actor.id {
            return Err(FollowError::SelfFollow);
        }

        let outcome = match self.follows.follow(actor.id, target.id).await? {
            Some(_) => FollowOutcome::Created,
            None => FollowOutcome::AlreadyFollowing,
        };

        info!(
            target = "scribe::application::follows",
            follower = %actor.username,
            author = %target.username,
            outcome = ?outcome,
            "follow requested"
        );
        Ok(outcome)
    }

    pub async fn unfollow(
        &self,
        actor: &AuthorRecord,
        username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let target = self.require_author(username).await?;

        let outcome = if self.follows.unfollow(actor.id, target.id).await? {
            FollowOutcome::Removed
        } else {
            FollowOutcome::NotFollowing
        };

        info!(
            target = "scribe::application::follows",
            follower = %actor.username,
            author = %target.username,
            outcome = ?outcome,
            "unfollow requested"
        );
        Ok(outcome)
    }

    pub async fn is_following(
        &self,
        follower_id: i64,
        author_id: i64,
    ) -> Result<bool, FollowError> {
        if follower_id == author_id {
            return Ok(false);
        }
        Ok(self.follows.is_following(follower_id, author_id).await?)
    }

    async fn require_author(&self, username: &str) -> Result<AuthorRecord, FollowError> {
        self.authors
            .find_by_username(username)
            .await?
            .ok_or_else(|| FollowError::UnknownAuthor(username.to_string()))
    }
}
