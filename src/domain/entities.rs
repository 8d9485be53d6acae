use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub created_at: OffsetDateTime,
}

impl AuthorRecord {
    /// Display name when set, otherwise the username.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A post joined with the author and group columns the feeds render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_display_name: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl PostSummary {
    pub fn author_label(&self) -> &str {
        if self.author_display_name.trim().is_empty() {
            &self.author_username
        } else {
            &self.author_display_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRecord {
    pub id: i64,
    pub follower_id: i64,
    pub author_id: i64,
    pub created_at: OffsetDateTime,
}
