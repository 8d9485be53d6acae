//! Operator-side group management.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreateGroupParams, GroupsRepo, RepoError};
use crate::domain::entities::GroupRecord;
use crate::domain::slug::{SlugError, derive_slug, unique_slug, validate_slug};

#[derive(Debug, Clone, Default)]
pub struct CreateGroupCommand {
    pub title: String,
    pub slug: Option<String>,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("group title must not be empty")]
    EmptyTitle,
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("group slug `{0}` is already taken")]
    SlugTaken(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupsRepo>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupsRepo>) -> Self {
        Self { groups }
    }

    pub async fn list(&self) -> Result<Vec<GroupRecord>, GroupError> {
        Ok(self.groups.list_groups().await?)
    }

    /// Create a group. An explicit slug must be free; a derived one gets a
    /// numeric suffix when the base is taken.
    pub async fn create(&self, command: CreateGroupCommand) -> Result<GroupRecord, GroupError> {
        let title = command.title.trim().to_string();
        if title.is_empty() {
            return Err(GroupError::EmptyTitle);
        }

        let slug = match command.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => {
                validate_slug(explicit)?;
                if self.groups.find_by_slug(explicit).await?.is_some() {
                    return Err(GroupError::SlugTaken(explicit.to_string()));
                }
                explicit.to_string()
            }
            _ => {
                let base = derive_slug(&title)?;
                let taken: HashSet<String> = self
                    .groups
                    .list_groups()
                    .await?
                    .into_iter()
                    .map(|group| group.slug)
                    .collect();
                unique_slug(&base, |candidate| taken.contains(candidate))?
            }
        };

        let group = self
            .groups
            .create_group(CreateGroupParams {
                title,
                slug: slug.clone(),
                description: command.description.trim().to_string(),
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => GroupError::SlugTaken(slug),
                other => GroupError::Repo(other),
            })?;

        info!(
            target = "scribe::application::groups",
            group_id = group.id,
            slug = %group.slug,
            "group created"
        );
        Ok(group)
    }
}
