use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::pagination::{Page, PageRequest, Paginator};
use crate::application::repos::{
    AuthorsRepo, GroupsRepo, PostQueryFilter, PostsRepo, RepoError,
};
use crate::domain::entities::{AuthorRecord, GroupRecord, PostSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFilter {
    All,
    Group(String),
    Author(String),
    /// Posts by every author the given author follows.
    Followed(i64),
}

impl FeedFilter {
    pub fn base_path(&self) -> String {
        match self {
            FeedFilter::All => "/".to_string(),
            FeedFilter::Group(slug) => format!("/group/{slug}/"),
            FeedFilter::Author(username) => format!("/profile/{username}/"),
            FeedFilter::Followed(_) => "/follow/".to_string(),
        }
    }
}

/// What a feed page is about, beyond its posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    All,
    Group(GroupRecord),
    Author {
        author: AuthorRecord,
        post_count: u64,
    },
    Followed,
}

#[derive(Debug, Clone)]
pub struct FeedPage {
    pub scope: FeedScope,
    pub page: Page<PostSummary>,
    pub base_path: String,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group `{0}`")]
    UnknownGroup(String),
    #[error("unknown author `{0}`")]
    UnknownAuthor(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    authors: Arc<dyn AuthorsRepo>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        authors: Arc<dyn AuthorsRepo>,
        paginator: Paginator,
    ) -> Self {
        Self {
            posts,
            groups,
            authors,
            paginator,
        }
    }

    pub fn paginator(&self) -> Paginator {
        self.paginator
    }

    /// Resolve the filter, count matching posts and load the requested page.
    pub async fn assemble_feed(
        &self,
        filter: FeedFilter,
        request: PageRequest,
    ) -> Result<FeedPage, FeedError> {
        let base_path = filter.base_path();
        let (scope, query) = self.resolve_scope(filter).await?;

        let total = self.posts.count_posts(&query).await?;
        let plan = self.paginator.plan(request, total);
        let items = self.posts.list_posts(&query, plan.window).await?;

        debug!(
            target = "scribe::application::feed",
            total,
            page = plan.number,
            num_pages = plan.num_pages,
            returned = items.len(),
            "assembled feed page"
        );

        let scope = match scope {
            FeedScope::Author { author, .. } => FeedScope::Author {
                author,
                post_count: total,
            },
            other => other,
        };

        Ok(FeedPage {
            scope,
            page: Page::new(items, plan),
            base_path,
        })
    }

    async fn resolve_scope(
        &self,
        filter: FeedFilter,
    ) -> Result<(FeedScope, PostQueryFilter), FeedError> {
        match filter {
            FeedFilter::All => Ok((FeedScope::All, PostQueryFilter::all())),
            FeedFilter::Group(slug) => {
                let group = self
                    .groups
                    .find_by_slug(&slug)
                    .await?
                    .ok_or(FeedError::UnknownGroup(slug))?;
                let query = PostQueryFilter::group(group.id);
                Ok((FeedScope::Group(group), query))
            }
            FeedFilter::Author(username) => {
                let author = self
                    .authors
                    .find_by_username(&username)
                    .await?
                    .ok_or(FeedError::UnknownAuthor(username))?;
                let query = PostQueryFilter::author(author.id);
                Ok((
                    FeedScope::Author {
                        author,
                        post_count: 0,
                    },
                    query,
                ))
            }
            FeedFilter::Followed(follower_id) => Ok((
                FeedScope::Followed,
                PostQueryFilter::followed_by(follower_id),
            )),
        }
    }
}
