//! Post lifecycle: creation, author-only edits, detail reads and comments.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostQueryFilter, PostsRepo,
    PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::{AuthorRecord, CommentRecord, GroupRecord, PostRecord, PostSummary};
use crate::domain::error::DomainError;
use crate::domain::posts::{TextValidator, normalize_image_ref, validate_text};

/// Submitted post form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<DomainError> for FieldError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { field, message } => Self { field, message },
            other => Self::new("__all__", other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum PostError {
    #[error("post {0} not found")]
    NotFound(i64),
    #[error("author {actor_id} is not the author of post {post_id}")]
    NotAuthor { post_id: i64, actor_id: i64 },
    #[error("submitted post is invalid")]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostSummary,
    pub comments: Vec<CommentRecord>,
    pub author_post_count: u64,
}

struct ValidPost {
    text: String,
    group_id: Option<i64>,
    image: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    validator: TextValidator,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            posts,
            writer,
            groups,
            comments,
            validator: validate_text,
        }
    }

    /// Replace the text predicate used for posts and comments.
    pub fn with_validator(mut self, validator: TextValidator) -> Self {
        self.validator = validator;
        self
    }

    pub async fn list_groups(&self) -> Result<Vec<GroupRecord>, PostError> {
        Ok(self.groups.list_groups().await?)
    }

    pub async fn create_post(
        &self,
        actor: &AuthorRecord,
        input: PostInput,
    ) -> Result<PostRecord, PostError> {
        let valid = self.validate(input).await?;
        let post = self
            .writer
            .create_post(CreatePostParams {
                author_id: actor.id,
                group_id: valid.group_id,
                text: valid.text,
                image: valid.image,
            })
            .await?;

        info!(
            target = "scribe::application::posts",
            post_id = post.id,
            author = %actor.username,
            group_id = ?post.group_id,
            "post created"
        );
        Ok(post)
    }

    /// Load a post for its edit form. Only the author may open it.
    pub async fn post_for_edit(
        &self,
        actor: &AuthorRecord,
        post_id: i64,
    ) -> Result<PostSummary, PostError> {
        let post = self.require_post(post_id).await?;
        ensure_author(actor, &post)?;
        Ok(post)
    }

    /// Apply an edit. Ownership is checked before the input is validated.
    pub async fn edit_post(
        &self,
        actor: &AuthorRecord,
        post_id: i64,
        input: PostInput,
    ) -> Result<PostRecord, PostError> {
        let current = self.require_post(post_id).await?;
        ensure_author(actor, &current)?;

        let valid = self.validate(input).await?;
        let post = self
            .writer
            .update_post(UpdatePostParams {
                id: post_id,
                group_id: valid.group_id,
                text: valid.text,
                image: valid.image,
            })
            .await?;

        info!(
            target = "scribe::application::posts",
            post_id,
            author = %actor.username,
            "post edited"
        );
        Ok(post)
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail, PostError> {
        let post = self.require_post(post_id).await?;
        let comments = self.comments.list_for_post(post_id).await?;
        let author_post_count = self
            .posts
            .count_posts(&PostQueryFilter::author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    pub async fn add_comment(
        &self,
        actor: &AuthorRecord,
        post_id: i64,
        text: &str,
    ) -> Result<CommentRecord, PostError> {
        self.require_post(post_id).await?;
        if let Err(err) = (self.validator)(text) {
            debug!(
                target = "scribe::application::posts",
                post_id,
                author = %actor.username,
                reason = %err,
                "comment rejected"
            );
            return Err(PostError::Invalid(vec![err.into()]));
        }

        let comment = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: actor.id,
                text: text.trim().to_string(),
            })
            .await?;

        info!(
            target = "scribe::application::posts",
            post_id,
            comment_id = comment.id,
            author = %actor.username,
            "comment added"
        );
        Ok(comment)
    }

    async fn require_post(&self, post_id: i64) -> Result<PostSummary, PostError> {
        self.posts
            .find_post(post_id)
            .await?
            .ok_or(PostError::NotFound(post_id))
    }

    async fn validate(&self, input: PostInput) -> Result<ValidPost, PostError> {
        let mut errors = Vec::new();

        if let Err(err) = (self.validator)(&input.text) {
            errors.push(FieldError::from(err));
        }

        let image = match normalize_image_ref(input.image.as_deref()) {
            Ok(image) => image,
            Err(err) => {
                errors.push(FieldError::from(err));
                None
            }
        };

        if let Some(group_id) = input.group_id
            && self.groups.find_by_id(group_id).await?.is_none()
        {
            errors.push(FieldError::new(
                "group",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }

        if !errors.is_empty() {
            return Err(PostError::Invalid(errors));
        }

        Ok(ValidPost {
            text: input.text.trim().to_string(),
            group_id: input.group_id,
            image,
        })
    }
}

fn ensure_author(actor: &AuthorRecord, post: &PostSummary) -> Result<(), PostError> {
    if post.author_id == actor.id {
        Ok(())
    } else {
        Err(PostError::NotAuthor {
            post_id: post.id,
            actor_id: actor.id,
        })
    }
}
